mod acquire;
mod backup;
mod cli;
mod decide;
mod deps;
mod desktop;
mod errors;
mod install;
mod probe;
mod remote;
mod target;
mod uninstall;
mod version;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
