use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pointers::{Unique, make_shared, make_unique};
use std::fmt;

#[derive(Parser)]
#[command(name = "pointers-demo", about = "Walk through Unique and Shared ownership")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log every free and release at trace level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Move, reset and release a Unique
    Unique,
    /// Clone and move a Shared, printing use counts
    Shared,
    /// Run both walkthroughs
    All,
}

struct Point {
    x: i32,
    y: i32,
}

impl Point {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.x, self.y)
    }
}

fn unique_demo() -> Result<()> {
    let mut ptr = make_unique(Point::new(10, 20));
    println!("{}", *ptr);

    let mut ptr2: Unique<Point> = ptr.take();
    if ptr.get().is_none() {
        println!("ptr is now null");
    }
    println!("{}", ptr2.try_deref()?);

    ptr2.reset();
    if ptr2.get().is_none() {
        println!("ptr2 is now null");
    }

    ptr2.reset_to(Point::new(30, 40));
    println!("{}", ptr2.try_deref()?);

    let raw = ptr2.release();
    if ptr2.get().is_none() {
        println!("ptr2 is now null after release");
    }
    // SAFETY: `raw` came from `release` and is freed exactly once here.
    let reclaimed = unsafe { Unique::from_raw(raw) };
    log::debug!("reclaimed released point {}", reclaimed.try_deref()?);
    Ok(())
}

fn shared_demo() -> Result<()> {
    let ptr1 = make_shared(Point::new(10, 20));
    println!("{}", *ptr1);
    println!("ptr1 use count: {}", ptr1.use_count());

    let mut ptr2 = ptr1.clone();
    println!("{}", ptr2.try_deref()?);
    println!("ptr1 use count: {}", ptr1.use_count());
    println!("ptr2 use count: {}", ptr2.use_count());

    let ptr3 = ptr2.take();
    println!("{}", ptr3.try_deref().context("moved share is empty")?);
    println!("ptr1 use count: {}", ptr1.use_count());
    println!("ptr2 use count: {}", ptr2.use_count());
    println!("ptr3 use count: {}", ptr3.use_count());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Trace);
    }
    builder.init();

    match cli.command.unwrap_or(Command::All) {
        Command::Unique => unique_demo()?,
        Command::Shared => shared_demo()?,
        Command::All => {
            unique_demo()?;
            shared_demo()?;
        }
    }
    Ok(())
}
