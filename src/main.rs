extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;
extern crate masm;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use masm::assembler::{self, Mode};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn main() {
    let args = process_arguments();
    let level = level_for(args.occurrences_of("verbose"));
    initialize_logging(level);

    let mode = if args.is_present("plain") { Mode::Plain } else { Mode::Arguments };

    debug!("Arguments:\n\tVerbosity: {}\n\tMode: {:?}\n\tOutfile: {}\n\tInfile: {}",
        level,
        mode,
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap_or("None")
    );

    // INPUT is required, clap has already rejected a missing one.
    let ipath = Path::new(args.value_of("INPUT").unwrap_or_default());

    let source = match fs::read_to_string(ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(text) => text,
    };

    let program = match assembler::assemble_listing(&source, mode) {
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
        Ok(program) => program,
    };

    if args.is_present("print-debug") {
        let mut grid = Grid::new(GridOptions {
            filling:     Filling::Spaces(1),
            direction:   Direction::LeftToRight,
        });

        for (idx, emitted) in program.iter().enumerate() {
            grid.add(Cell::from(format!("{:02X}:", idx)));
            grid.add(Cell::from(format!("{}", emitted.instruction)));
            grid.add(Cell::from(format!("(line {})", emitted.line)));
            grid.add(Cell::from("=>".to_string()));
            grid.add(Cell::from(emitted.word().to_string()));
        }

        println!("{}", grid.fit_into_columns(5));
    }

    let opath = match args.value_of("output") {
        Some(filename) => PathBuf::from(filename),
        None => ipath.with_extension("mif"),
    };

    let words: Vec<_> = program.iter().map(|e| e.word()).collect();
    let name = ipath.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let ofile = match File::create(&opath) {
        Err(err) => {
            error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    let mut out = BufWriter::new(ofile);
    if let Err(err) = assembler::mif::write(&mut out, &name, &words).and_then(|_| out.flush()) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }

    info!("wrote {} word(s) to `{}`", words.len(), opath.display());
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write output to an outfile (defaults to INPUT with a .mif extension)"))
        .arg(Arg::with_name("plain")
            .short("p")
            .long("plain")
            .takes_value(false)
            .help("disables call arguments and routine parameters"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .long("show")
            .takes_value(false)
            .help("prints each address, instruction, source line and machine word to STDOUT"))
        .get_matches()
}

fn level_for(verbosity: u64) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

fn initialize_logging(level: log::LevelFilter) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply().ok();
}
