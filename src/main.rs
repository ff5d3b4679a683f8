use clap::{arg,crate_version,Command};
use std::fs;
use std::io;
use std::path::{Path,PathBuf};
use zlzw::{decode,encode,Options,STD_OPTIONS};

const RCH: &str = "unreachable was reached";

/// Exit code `compress.c` uses when a file is left alone because compressing
/// it would not have shrunk it.
const EXIT_NO_SAVINGS: i32 = 2;

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();

    let long_help =
"Examples:
---------
Compress a file:      `zcompress compress -i hamlet.txt -o hamlet.txt.Z`
Expand a file:         `zcompress expand -i hamlet.txt.Z -o hamlet.txt`
Compress a tree:       `zcompress compress -i ./plays -r`
Filter stdin to stdout: `zcompress pipe compress < hamlet.txt > hamlet.txt.Z`";

    let mut main_cmd = Command::new("zcompress")
        .about("Compress and expand files in the classic .Z LZW stream format")
        .after_long_help(long_help)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path (file, or directory with -r)").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(false))
        .arg(arg!(-b --bits <BITS> "max code width, 9..=16").required(false))
        .arg(arg!(-f --force "overwrite an existing output path without asking"))
        .arg(arg!(-v --verbose "print the compression ratio to stderr"))
        .arg(arg!(-r --recursive "descend into a directory given as -i"))
        .about("compress a file or directory tree"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path (file, or directory with -r)").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(false))
        .arg(arg!(-f --force "overwrite an existing output path without asking"))
        .arg(arg!(-r --recursive "descend into a directory given as -i"))
        .about("expand a .Z file or directory tree"));

    main_cmd = main_cmd.subcommand(Command::new("pipe")
        .arg(arg!(<MODE> "compress or expand").value_parser(["compress","expand"]))
        .arg(arg!(-b --bits <BITS> "max code width, 9..=16 (compress only)").required(false))
        .about("filter stdin to stdout, no file lifecycle"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let input = Path::new(cmd.get_one::<String>("input").expect(RCH));
        let output = cmd.get_one::<String>("output").map(PathBuf::from);
        let opt = Options { max_bits: parse_bits(cmd)?, block_mode: true };
        let force = cmd.get_flag("force");
        let verbose = cmd.get_flag("verbose");
        if cmd.get_flag("recursive") {
            walk_tree(input, &mut |p| compress_file(p, &with_suffix(p,"Z"), &opt, force, verbose).map(|_| ()))?;
        } else {
            let output = output.unwrap_or_else(|| with_suffix(input,"Z"));
            if !compress_file(input, &output, &opt, force, verbose)? {
                std::process::exit(EXIT_NO_SAVINGS);
            }
        }
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let input = Path::new(cmd.get_one::<String>("input").expect(RCH));
        let output = cmd.get_one::<String>("output").map(PathBuf::from);
        let force = cmd.get_flag("force");
        if cmd.get_flag("recursive") {
            walk_tree(input, &mut |p| expand_file(p, &without_suffix(p,"Z"), force))?;
        } else {
            let output = output.unwrap_or_else(|| without_suffix(input,"Z"));
            expand_file(input, &output, force)?;
        }
    }

    if let Some(cmd) = matches.subcommand_matches("pipe") {
        let mode = cmd.get_one::<String>("MODE").expect(RCH);
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut src = stdin.lock();
        let mut dst = stdout.lock();
        match mode.as_str() {
            "compress" => {
                let opt = Options { max_bits: parse_bits(cmd)?, block_mode: true };
                encode(&mut src, &mut dst, &opt)?;
            }
            "expand" => {
                decode(&mut src, &mut dst)?;
            }
            _ => unreachable!("{}", RCH)
        }
    }

    Ok(())
}

/// Parse `-b`/`--bits`, defaulting to `STD_OPTIONS.max_bits` and clamping to
/// `[9,16]` as `compress.c`'s `-b` flag does.
fn parse_bits(cmd: &clap::ArgMatches) -> Result<usize,Box<dyn std::error::Error>> {
    match cmd.get_one::<String>("bits") {
        None => Ok(STD_OPTIONS.max_bits),
        Some(s) => {
            let n: usize = s.parse()?;
            Ok(n.clamp(9,16))
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}

/// Strip a trailing `.Z` (or whatever `suffix` is) from `path`; if the path
/// does not carry that suffix, append `.out` instead, mirroring `compress.c`'s
/// refusal to silently overwrite a same-named file on expansion.
fn without_suffix(path: &Path, suffix: &str) -> PathBuf {
    let s = path.as_os_str().to_string_lossy();
    let dotted = format!(".{}",suffix);
    match s.strip_suffix(&dotted) {
        Some(stripped) => PathBuf::from(stripped),
        None => with_suffix(path,"out")
    }
}

/// Recursively visit every regular file under `root`, applying `f` to each.
/// Unreadable subdirectories are reported and skipped, matching `compress.c`'s
/// `compdir` diagnostic rather than aborting the whole traversal.
fn walk_tree(root: &Path, f: &mut dyn FnMut(&Path) -> Result<(),Box<dyn std::error::Error>>) -> Result<(),Box<dyn std::error::Error>> {
    if root.is_file() {
        return f(root);
    }
    let entries = match fs::read_dir(root) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("zcompress: {}: unreadable ({})",root.display(),e);
            return Ok(());
        }
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_tree(&path,f)?;
        } else if path.is_file() {
            if let Err(e) = f(&path) {
                eprintln!("zcompress: {}: {}",path.display(),e);
            }
        }
    }
    Ok(())
}

fn refuse_overwrite(output: &Path, force: bool) -> Result<(),Box<dyn std::error::Error>> {
    if !force && output.exists() {
        return Err(format!("{} already exists, use -f to overwrite",output.display()).into());
    }
    Ok(())
}

/// Compress `input` to `output`. Returns `Ok(true)` if the output was kept,
/// `Ok(false)` if it was removed because it did not shrink the input (and
/// `force` was not given) — the caller decides what that means for its exit
/// code, since a single-file invocation aborts on it but a recursive
/// traversal just moves on to the next file, matching `compress.c`.
fn compress_file(input: &Path, output: &Path, opt: &Options, force: bool, verbose: bool) -> Result<bool,Box<dyn std::error::Error>> {
    refuse_overwrite(output,force)?;
    log::debug!("compressing {} -> {}",input.display(),output.display());
    let mut src = fs::File::open(input)?;
    let mut dst = fs::File::create(output)?;
    let (bytes_in,bytes_out) = match encode(&mut src,&mut dst,opt) {
        Ok(v) => v,
        Err(e) => {
            drop(dst);
            let _ = fs::remove_file(output);
            return Err(Box::new(e));
        }
    };
    if verbose {
        eprintln!("{}: {}",input.display(),prratio(bytes_in,bytes_out));
    }
    if bytes_out >= bytes_in && !force {
        drop(dst);
        fs::remove_file(output)?;
        eprintln!("{}: no savings, file left unchanged (use -f to force)",input.display());
        return Ok(false);
    }
    copy_file_stat(input,output)?;
    Ok(true)
}

fn expand_file(input: &Path, output: &Path, force: bool) -> Result<(),Box<dyn std::error::Error>> {
    refuse_overwrite(output,force)?;
    log::debug!("expanding {} -> {}",input.display(),output.display());
    let mut src = fs::File::open(input)?;
    let mut dst = fs::File::create(output)?;
    match decode(&mut src,&mut dst) {
        Ok(_) => {}
        Err(e) => {
            drop(dst);
            let _ = fs::remove_file(output);
            return Err(Box::new(e));
        }
    }
    copy_file_stat(input,output)?;
    Ok(())
}

/// Copy modification time (via `filetime`) and permission bits from `input`
/// to `output`. Ownership is not preserved: `chown` requires privileges this
/// crate has no business assuming, and preserving it would pull in a
/// POSIX-only dependency for a cosmetic feature.
fn copy_file_stat(input: &Path, output: &Path) -> Result<(),Box<dyn std::error::Error>> {
    let meta = fs::metadata(input)?;
    let mtime = filetime::FileTime::from_last_modification_time(&meta);
    filetime::set_file_mtime(output,mtime)?;
    fs::set_permissions(output,meta.permissions())?;
    Ok(())
}

/// Fixed-point percentage reduction, mirroring `compress.c`'s `prratio`:
/// `100 * (1 - bytes_out/bytes_in)`, or "0.00%" for an empty input.
fn prratio(bytes_in: u64, bytes_out: u64) -> String {
    if bytes_in == 0 {
        return "0.00%".to_string();
    }
    let reduced = bytes_in.saturating_sub(bytes_out);
    let thousandths = (reduced * 100_000) / bytes_in;
    format!("{}.{:02}%",thousandths / 1000,(thousandths / 10) % 100)
}
