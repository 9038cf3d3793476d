//! Inspect an xtc trajectory from the command line.

#[cfg(feature = "cli")]
mod cli {
    use std::io::{self, Write};
    use std::path::PathBuf;

    use clap::Parser;
    use mdio::each_frame;

    /// Summarize an xtc trajectory.
    ///
    /// By default, a short summary of the trajectory is printed. The
    /// `--times` and `--steps` flags print the respective value for every
    /// frame instead.
    #[derive(Parser)]
    #[command(version)]
    struct Args {
        /// Input path (xtc).
        input: PathBuf,

        /// Print the time (ps) value for each frame to standard output.
        #[arg(long)]
        times: bool,

        /// Print the step number for each frame to standard output.
        ///
        /// If both `times` and `steps` are active, they will be separated by
        /// tabs and printed in that order.
        #[arg(long)]
        steps: bool,
    }

    pub fn main() -> io::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(io::stderr)
            .init();

        let args = Args::parse();

        let mut frames = each_frame(&args.input).unwrap_or_else(|err| {
            eprintln!(
                "ERROR: Failed to read trajectory from {:?}: {err}",
                &args.input
            );
            std::process::exit(1)
        });

        let mut stdout = io::stdout();
        let mut nframes = 0usize;
        let mut natoms = None;
        let mut first = None;
        let mut last = None;
        loop {
            let frame = match frames.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    eprintln!("ERROR: Failed to read frame {nframes}: {err}");
                    std::process::exit(1)
                }
            };

            if args.times || args.steps {
                if args.times {
                    write!(stdout, "{:.3}\t", frame.time)?;
                }
                if args.steps {
                    write!(stdout, "{}", frame.step)?;
                }
                writeln!(stdout)?;
            }

            nframes += 1;
            natoms.get_or_insert(frame.natoms());
            first.get_or_insert((frame.step, frame.time));
            last = Some((frame.step, frame.time));
        }

        if args.times || args.steps {
            return Ok(());
        }

        let name = args
            .input
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        println!("name:    {name}");
        println!("path:    {:?}", &args.input);
        println!("nframes: {nframes}");
        let natoms = natoms.map(|n| n.to_string()).unwrap_or("?".to_string());
        println!("natoms:  {natoms}");

        let steps = match (first, last) {
            (Some((first, _)), Some((last, _))) if nframes > 1 => format!("{first}-{last}"),
            (Some((first, _)), _) => first.to_string(),
            _ => "?".to_string(),
        };
        println!("steps:   {steps}");

        let times = match (first, last) {
            (Some((_, first)), Some((_, last))) if nframes > 1 => format!("{first}-{last}"),
            (Some((_, first)), _) => first.to_string(),
            _ => "?".to_string(),
        };
        println!("time:    {times} ps");

        let magic = match frames.magic() {
            Some(magic) => magic.to_string(),
            None => "?".to_string(),
        };
        println!("magic:   {magic}");

        Ok(())
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("The 'cli' feature must be enabled to use this binary.");
}

#[cfg(feature = "cli")]
fn main() -> std::io::Result<()> {
    cli::main()
}
