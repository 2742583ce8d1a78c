use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType};
use crossterm::{execute, queue};
use env_logger::Env;
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use fifteen_puzzle::puzzle::{Dir, MoveOutcome, Pos, Puzzle, WinReport, DEFAULT_SHUFFLE_MOVES};
use fifteen_puzzle::scoreboard::{format_clock, Scoreboard};

#[derive(Debug, Parser)]
#[command(author, version, about = "Sliding fifteen puzzle for the terminal")]
struct Cli {
    /// Board side length (produces an NxN grid)
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Random moves applied when scrambling
    #[arg(long, default_value_t = DEFAULT_SHUFFLE_MOVES)]
    shuffle_moves: usize,

    /// RNG seed for reproducible scrambles
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if cli.size < 2 {
        anyhow::bail!("board size must be at least 2");
    }

    let mut rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let mut puzzle = Puzzle::new(cli.size);
    puzzle.shuffle_with(&mut rng, cli.shuffle_moves);
    info!(
        "scrambled a {}x{} board with {} random moves",
        cli.size, cli.size, cli.shuffle_moves
    );

    let mut session = Session {
        puzzle,
        rng,
        shuffle_moves: cli.shuffle_moves,
        scoreboard: Scoreboard::new(),
        banner: None,
    };

    enable_raw_mode()?;
    let outcome = run(&mut session);
    // Restore the terminal even when the loop bailed out early.
    let _ = execute!(io::stdout(), Show);
    disable_raw_mode()?;
    outcome?;

    if let Some(moves) = session.scoreboard.best_moves() {
        info!("session best: {} moves", moves);
    }
    Ok(())
}

struct Session {
    puzzle: Puzzle,
    rng: SmallRng,
    shuffle_moves: usize,
    scoreboard: Scoreboard,
    // Set once the current board is solved; cleared by the next scramble.
    banner: Option<WinReport>,
}

impl Session {
    fn slide(&mut self, dir: Dir) {
        if self.banner.is_some() {
            // Solved boards stay frozen until the next scramble or reset.
            return;
        }
        match self.puzzle.move_dir(dir) {
            MoveOutcome::Rejected | MoveOutcome::Moved { .. } => {}
            MoveOutcome::Won(report) => {
                self.scoreboard.record(&report);
                self.banner = Some(report);
            }
        }
    }

    fn scramble(&mut self) {
        self.puzzle.shuffle_with(&mut self.rng, self.shuffle_moves);
        self.banner = None;
    }
}

fn run(session: &mut Session) -> Result<()> {
    let mut out = io::stdout();
    execute!(out, Hide)?;
    draw(&mut out, session)?;

    loop {
        // Redraw on a timeout as well, so the clock keeps ticking.
        if !poll(Duration::from_millis(250))? {
            draw(&mut out, session)?;
            continue;
        }

        match read()? {
            Event::Key(key) => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('n') => session.scramble(),
                    KeyCode::Char('r') => {
                        session.puzzle.reset();
                        session.banner = None;
                    }
                    KeyCode::Up => session.slide(Dir::Up),
                    KeyCode::Down => session.slide(Dir::Down),
                    KeyCode::Left => session.slide(Dir::Left),
                    KeyCode::Right => session.slide(Dir::Right),
                    _ => {}
                }
                draw(&mut out, session)?;
            }
            Event::Resize(_, _) => draw(&mut out, session)?,
            _ => {}
        }
    }

    execute!(out, Show, Clear(ClearType::All), MoveTo(0, 0))?;
    Ok(())
}

fn draw(out: &mut impl Write, session: &Session) -> Result<()> {
    let puzzle = &session.puzzle;
    let movable = puzzle.valid_moves();

    queue!(out, Clear(ClearType::All))?;

    for (row, cells) in puzzle.rows().iter().enumerate() {
        queue!(out, MoveTo(0, row as u16))?;
        for (col, &value) in cells.iter().enumerate() {
            let cell = if value == 0 {
                "   .".to_string()
            } else {
                format!("{:4}", value)
            };
            // Movable tiles are the ones adjacent to the empty slot.
            if movable.contains(&Pos::new(row, col)) {
                queue!(
                    out,
                    SetAttribute(Attribute::Bold),
                    Print(cell),
                    SetAttribute(Attribute::Reset)
                )?;
            } else {
                queue!(out, Print(cell))?;
            }
        }
    }

    let status = puzzle.size() as u16 + 1;
    queue!(
        out,
        MoveTo(0, status),
        Print(format!(
            "moves {}   time {}",
            puzzle.move_count(),
            format_clock(puzzle.elapsed())
        ))
    )?;

    let best_moves = session
        .scoreboard
        .best_moves()
        .map_or_else(|| "-".to_string(), |m| m.to_string());
    let best_time = session
        .scoreboard
        .best_time()
        .map_or_else(|| "-".to_string(), format_clock);
    queue!(
        out,
        MoveTo(0, status + 1),
        Print(format!(
            "best moves {}   best time {}",
            best_moves, best_time
        ))
    )?;

    queue!(
        out,
        MoveTo(0, status + 2),
        Print("arrows slide tiles, n scrambles, r resets, q quits")
    )?;

    if let Some(report) = &session.banner {
        queue!(
            out,
            MoveTo(0, status + 4),
            SetAttribute(Attribute::Bold),
            Print(format!(
                "Solved in {} moves, {}",
                report.moves,
                format_clock(report.elapsed)
            )),
            SetAttribute(Attribute::Reset)
        )?;
    }

    out.flush()?;
    Ok(())
}
