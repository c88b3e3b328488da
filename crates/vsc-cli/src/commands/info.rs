//! Info command handler

/// Lines printed by `vsc info`
pub const USAGE: &[(&str, &str)] = &[
    ("set <address>", "the address of the server to send data to"),
    ("push", "send the current folder to the server"),
    ("pull <name>", "get the specified folder from the server"),
    ("all", "get the names of all folders stored on the server"),
    ("info", "show this list"),
];

/// Print the available commands; no side effects
pub fn info() {
    let width = USAGE.iter().map(|(cmd, _)| cmd.len()).max().unwrap_or(0);
    for (command, description) in USAGE {
        println!("{:width$}  {}", command, description, width = width);
    }
}
