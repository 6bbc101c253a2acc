//! Status line printing.

use wgctl::output::{Status, status_line};

/// Print `ERROR: message` and exit with status 1.
pub fn fatal(message: &str) -> ! {
    println!("ERROR: {}", message);
    std::process::exit(1);
}

pub fn ok(message: &str) {
    println!("{}", status_line(Status::Ok, message));
}

pub fn error(message: &str) {
    println!("{}", status_line(Status::Failed, message));
}

pub fn info(message: &str) {
    println!("{}", status_line(Status::Progress, message));
}

pub fn up(message: &str) {
    println!("{}", status_line(Status::Up, message));
}

pub fn down(message: &str) {
    println!("{}", status_line(Status::Down, message));
}
