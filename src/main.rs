use env_logger::Env;
use log::warn;
use myshell::{Interpreter, signals};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = signals::install_interrupt_handler() {
        warn!("can't install interrupt handler: {}", err);
    }

    let interpreter = Interpreter::default();
    println!("{}", interpreter.config().init_message);

    let exit_code = interpreter.repl();
    std::process::exit(exit_code);
}
