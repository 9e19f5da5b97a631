mod command;
mod config;
mod insight;
mod tui;
mod tutorial_flag;
mod util;
mod view;

fn main() -> anyhow::Result<()> {
    command::run()
}
