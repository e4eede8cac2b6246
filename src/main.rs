use std::env;
use std::path::Path;
use std::process;

use log::LevelFilter;

fn main() {
  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    eprintln!("Incorrect Usage of the Tool!");
    eprintln!("Correct Usage: \"eko <file_name.eko>\"");
    process::exit(1);
  }

  initialize_logging();

  if let Err(err) = eko::driver::compile(Path::new(&args[1])) {
    eprintln!("{err:#}");
    process::exit(1);
  }
}

fn initialize_logging() {
  let level = match env::var("EKO_LOG").as_deref() {
    Ok("error") => LevelFilter::Error,
    Ok("info") => LevelFilter::Info,
    Ok("debug") => LevelFilter::Debug,
    _ => LevelFilter::Warn,
  };

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
    .chain(std::io::stderr())
    .apply()
    .ok();
}
