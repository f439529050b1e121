//! `nxc`: reads one or more Nexsys2 source files, solves each independently,
//! and prints `name=value` lines. Exits non-zero on the first file that
//! fails to parse, solve, or be read.
//!
//! Grounded on `original_source/nexsys2.py`'s CLI entry point: plain
//! positional file-path arguments, no environment variables, no config
//! file. `--margin`/`--limit` are parsed by hand since neither the teacher's
//! `nexsys` `Cargo.toml` nor `original_source/nexsys2.py` pulls in an
//! argument-parsing library.

use std::process::ExitCode;

const DEFAULT_MARGIN: f64 = 1e-9;
const DEFAULT_LIMIT: usize = 200;

struct Args
{
    paths: Vec<String>,
    margin: f64,
    limit: usize,
}

fn parse_args() -> anyhow::Result<Args>
{
    let mut paths = vec![];
    let mut margin = DEFAULT_MARGIN;
    let mut limit = DEFAULT_LIMIT;

    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next()
    {
        match arg.as_str()
        {
            "--margin" =>
            {
                let value = raw.next().ok_or_else(|| anyhow::anyhow!("--margin requires a value"))?;
                margin = value.parse()?;
            }
            "--limit" =>
            {
                let value = raw.next().ok_or_else(|| anyhow::anyhow!("--limit requires a value"))?;
                limit = value.parse()?;
            }
            other => paths.push(other.to_owned()),
        }
    }

    if paths.is_empty()
    {
        anyhow::bail!("usage: nxc [--margin M] [--limit N] FILE...");
    }

    Ok(Args { paths, margin, limit })
}

fn run() -> anyhow::Result<()>
{
    let args = parse_args()?;

    for path in &args.paths
    {
        let text = std::fs::read_to_string(path)?;
        let (_trail, soln) = nexsys::solve(&text, args.margin, args.limit)?;

        let mut names: Vec<&String> = soln.keys().collect();
        names.sort();
        for name in names
        {
            println!("{name}={}", soln[name]);
        }
    }

    Ok(())
}

fn main() -> ExitCode
{
    match run()
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) =>
        {
            eprintln!("nxc: {err}");
            ExitCode::FAILURE
        }
    }
}
