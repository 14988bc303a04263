// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

const INSTALL_SCRIPT_PATH: &str = "/tmp/install.sh";

/// Start command that installs and launches the remote-access helper,
/// then runs the app's own start command when it has one.
pub fn bootstrap_command(bootstrap_url: &str, original_command: &str) -> String {
    let install = format!("curl -s {bootstrap_url} > {INSTALL_SCRIPT_PATH} && bash {INSTALL_SCRIPT_PATH}");
    match original_command.trim() {
        "" => install,
        command => format!("{install} && {command}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/install.sh";

    #[test]
    fn test_chains_original_command() {
        assert_eq!(
            bootstrap_command(URL, "node app.js"),
            "curl -s https://example.com/install.sh > /tmp/install.sh && bash /tmp/install.sh && node app.js"
        );
    }

    #[test]
    fn test_blank_original_command_is_not_chained() {
        let expected = "curl -s https://example.com/install.sh > /tmp/install.sh && bash /tmp/install.sh";
        assert_eq!(bootstrap_command(URL, ""), expected);
        assert_eq!(bootstrap_command(URL, "   "), expected);
    }
}
