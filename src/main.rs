use anyhow::{Context, bail};
use batch_readline::config::Config;
use batch_readline::logger::{flush_logger, init_logger};
use batch_readline::{LineReader, ReadLine};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;
use tracing::{info, warn};

fn main() -> ExitCode {
    let config = Config::from_cli(std::env::args_os());
    init_logger(Some(&config.log_level), config.log_file.as_deref());

    let result = run(&config);
    flush_logger();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("batch-readline: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);

    if config.reads_fragments() {
        let mut fragments = config.execute.iter();
        let first = fragments.next().map_or("", String::as_str);
        let mut reader = LineReader::from_fragment(first).context("failed to seed command")?;
        for fragment in fragments {
            reader
                .seed_fragment(fragment)
                .context("failed to seed command")?;
        }
        copy_lines(&mut reader, &mut out, config)?;
    } else {
        let file = open_input(config)?;
        let mut reader = LineReader::builder(file)
            .chunk_size(config.chunk_size)
            .max_capacity(config.max_buffer)
            .build_checked()
            .context("failed to open line source")?;
        copy_lines(&mut reader, &mut out, config)?;
    }

    out.flush().context("failed to write output")?;
    Ok(())
}

fn open_input(config: &Config) -> anyhow::Result<File> {
    match &config.input {
        Some(path) => {
            File::open(path).with_context(|| format!("failed to open {}", path.display()))
        }
        None => stdin_file(),
    }
}

#[cfg(unix)]
fn stdin_file() -> anyhow::Result<File> {
    use std::os::fd::AsFd;

    let fd = io::stdin()
        .as_fd()
        .try_clone_to_owned()
        .context("failed to duplicate stdin")?;
    Ok(File::from(fd))
}

#[cfg(windows)]
fn stdin_file() -> anyhow::Result<File> {
    use std::os::windows::io::AsHandle;

    let handle = io::stdin()
        .as_handle()
        .try_clone_to_owned()
        .context("failed to duplicate stdin")?;
    Ok(File::from(handle))
}

fn copy_lines<R: Read>(
    reader: &mut LineReader<R>,
    out: &mut impl Write,
    config: &Config,
) -> anyhow::Result<()> {
    let mut count = 0usize;

    while let Some(line) = reader.read_line(config.binary) {
        count = count.saturating_add(1);
        out.write_all(line).context("failed to write output")?;
        out.write_all(b"\n").context("failed to write output")?;

        if reader.truncated() {
            if config.abort_on_truncation {
                bail!(
                    "line {count} exceeds the {} byte buffer limit",
                    reader.max_capacity()
                );
            }
            warn!(line = count, "line truncated at buffer limit");
        }
    }

    if let Some(e) = reader.last_error() {
        bail!("failed after {count} lines: {e}");
    }

    info!(lines = count, "finished reading lines");
    Ok(())
}
