//! Terminal chess session against the arbitrated opponent
//!
//! Owns the authoritative game history through a [`GameSession`] and asks
//! the arbitration engine for the opponent's replies. Without a
//! `GEMINI_API_KEY` the engine degrades to random fallback moves, so the
//! binary also works offline.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use shakmaty::{Chess, Color, File, Position, Rank, Square};
use tracing_subscriber::EnvFilter;

use llmchess_arbiter::{
    Arbiter, ArbiterConfig, GameSession, GeminiClient, GeminiConfig, MoveKind,
};

#[derive(Parser, Debug)]
#[command(name = "llmchess", about = "Play chess against an LLM opponent")]
struct Args {
    /// Color to play
    #[arg(long, default_value = "white", value_parser = parse_color)]
    color: Color,

    /// Gemini model name (overrides GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Resume from an existing movetext, e.g. "1. e4 e5"
    #[arg(long)]
    resume: Option<String>,
}

fn parse_color(value: &str) -> Result<Color, String> {
    match value.to_ascii_lowercase().as_str() {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        other => Err(format!("expected `white` or `black`, got `{other}`")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = GeminiConfig::from_env();
    if let Some(model) = args.model {
        config.model = model;
    }
    if config.api_key.is_none() {
        println!("No GEMINI_API_KEY set; the opponent will play random fallback moves.");
    }
    let arbiter = Arbiter::new(
        Box::new(GeminiClient::new(config)),
        ArbiterConfig::default(),
    );

    let mut session = match &args.resume {
        Some(movetext) => GameSession::from_movetext(args.color, movetext)
            .context("`--resume` movetext does not replay to a legal position")?,
        None => GameSession::new(args.color),
    };

    println!("You play {}. Enter moves in SAN (e.g. e4, Nf3, O-O).", side_name(args.color));
    println!("Commands: board, moves, random, new, quit");

    let stdin = io::stdin();
    loop {
        print_board(session.position());

        if announce_if_over(&session) {
            break;
        }

        if session.awaiting_opponent() {
            println!("Opponent is thinking...");
            let result = arbiter.arbitrate(&session.movetext()).await?;
            let kind = session
                .apply_reply(&result.movetext)
                .context("arbitrated reply was not a one-ply extension")?;
            let last = session.movetext();
            let last = last.split_whitespace().last().unwrap_or("?");
            let source = if result.used_external_service {
                "LLM"
            } else {
                "fallback"
            };
            println!("Opponent plays {last} ({source}). {}", kind_remark(kind));
            continue;
        }

        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" => break,
            "new" => {
                session.reset();
                println!("New game.");
                continue;
            }
            "board" => continue,
            "moves" => {
                let sans: Vec<String> = session
                    .position()
                    .legal_moves()
                    .iter()
                    .map(|m| {
                        shakmaty::san::SanPlus::from_move(session.position().clone(), m)
                            .to_string()
                    })
                    .collect();
                println!("Legal: {}", sans.join(" "));
                continue;
            }
            "random" => match session.play_random_move() {
                Ok(kind) => println!("You play a random move. {}", kind_remark(kind)),
                Err(err) => println!("{err}"),
            },
            san => match session.play_human_san(san) {
                Ok(kind) => println!("{}", kind_remark(kind)),
                Err(err) => println!("{err}"),
            },
        }
    }

    println!("Final position: {}", session.movetext());
    Ok(())
}

fn announce_if_over(session: &GameSession) -> bool {
    let status = session.status();
    if status.is_over() {
        let (title, detail) = status.announcement();
        println!("{title} {detail}");
        true
    } else {
        false
    }
}

fn kind_remark(kind: MoveKind) -> &'static str {
    match kind {
        MoveKind::Win => "Checkmate!",
        MoveKind::Loss => "Checkmate.",
        MoveKind::Draw => "The game is drawn.",
        MoveKind::Check => "Check!",
        MoveKind::Castle => "Castled.",
        MoveKind::Capture => "Capture.",
        MoveKind::Normal => "",
    }
}

fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

fn print_board(pos: &Chess) {
    let board = pos.board();
    for rank in (0..8).rev() {
        print!("{} ", rank + 1);
        for file in 0..8 {
            let sq = Square::from_coords(File::new(file), Rank::new(rank));
            match board.piece_at(sq) {
                Some(piece) => print!(" {}", piece.char()),
                None => print!(" ."),
            }
        }
        println!();
    }
    println!("   a b c d e f g h");
}
