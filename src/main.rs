mod app;
mod browser;
mod catalog;
mod compose;
mod config;
mod detail;
mod runtime;
mod search;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
