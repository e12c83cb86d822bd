//! Module `command`
//!
//! Builds the shell script that starts PHP's built-in web server inside a
//! terminal session.

use crate::launcher::ElevationTemplate;

/// Ports below this need elevated privileges to bind
pub const PRIVILEGED_PORT_LIMIT: u16 = 1024;

/// Shell function that resets the terminal screen
const SCREEN_RESET_FN: &str = "screen_reset () { echo -ne '\\033c'; }";

/// Settings snapshot used for one server start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub executable_path: String,
    pub bind_address: String,
    pub port: u16,
    pub document_root: String,
    pub ini_path: Option<String>,
}

impl ServerConfig {
    pub fn needs_elevation(&self) -> bool {
        self.port < PRIVILEGED_PORT_LIMIT
    }
}

/// Builds the bare interpreter invocation, e.g.
/// `/usr/bin/php -S 127.0.0.1:8080 -t "/srv/www" -c /etc/php.ini`.
pub fn build_server_invocation(config: &ServerConfig) -> String {
    let ini = match &config.ini_path {
        Some(path) => format!(" -c {}", path),
        None => String::new(),
    };

    format!(
        "{} -S {}:{} -t \"{}\"{}",
        config.executable_path, config.bind_address, config.port, config.document_root, ini
    )
}

/// Builds the full script fed to the terminal session.
///
/// Privileged ports wrap the invocation once with the elevation template.
/// The script disables shell history, clears the screen, runs the server,
/// clears again only on a zero exit status and then exits quietly.
pub fn build_command(config: &ServerConfig, elevation: &ElevationTemplate) -> String {
    let mut command = build_server_invocation(config);

    if config.needs_elevation() {
        command = elevation.apply(&command);
    }

    format!(
        "{}; {}; {}; {}; {}; {}\n",
        "unset HISTFILE",
        SCREEN_RESET_FN,
        "screen_reset",
        command,
        "if [ $? -eq 0 ]; then screen_reset; fi",
        "exit &> /dev/null"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "unset HISTFILE; screen_reset () { echo -ne '\\033c'; }; screen_reset; ";
    const POSTAMBLE: &str = "; if [ $? -eq 0 ]; then screen_reset; fi; exit &> /dev/null\n";

    fn config(port: u16) -> ServerConfig {
        ServerConfig {
            executable_path: "/usr/bin/php".to_string(),
            bind_address: "127.0.0.1".to_string(),
            port,
            document_root: "/srv/www".to_string(),
            ini_path: None,
        }
    }

    fn body(script: &str) -> &str {
        script
            .strip_prefix(PREAMBLE)
            .and_then(|rest| rest.strip_suffix(POSTAMBLE))
            .expect("script wrapper")
    }

    #[test]
    fn test_unprivileged_port_is_not_elevated() {
        let pkexec = ElevationTemplate::new("pkexec %s").unwrap();
        let script = build_command(&config(8080), &pkexec);
        assert_eq!(body(&script), "/usr/bin/php -S 127.0.0.1:8080 -t \"/srv/www\"");
    }

    #[test]
    fn test_privileged_port_is_wrapped_once() {
        let pkexec = ElevationTemplate::new("pkexec %s").unwrap();
        let script = build_command(&config(21), &pkexec);
        assert_eq!(
            body(&script),
            "pkexec /usr/bin/php -S 127.0.0.1:21 -t \"/srv/www\""
        );
        assert_eq!(script.matches("pkexec").count(), 1);
    }

    #[test]
    fn test_privileged_port_without_elevation_tool() {
        let script = build_command(&config(80), &ElevationTemplate::identity());
        assert_eq!(body(&script), "/usr/bin/php -S 127.0.0.1:80 -t \"/srv/www\"");
    }

    #[test]
    fn test_ini_fragment_follows_document_root() {
        let mut cfg = config(8000);
        cfg.ini_path = Some("/etc/php/dev.ini".to_string());
        assert_eq!(
            build_server_invocation(&cfg),
            "/usr/bin/php -S 127.0.0.1:8000 -t \"/srv/www\" -c /etc/php/dev.ini"
        );
    }

    #[test]
    fn test_ini_fragment_sits_inside_elevation() {
        let gksu = ElevationTemplate::new("gksu '%s'").unwrap();
        let mut cfg = config(443);
        cfg.ini_path = Some("/etc/php/dev.ini".to_string());
        assert_eq!(
            body(&build_command(&cfg, &gksu)),
            "gksu '/usr/bin/php -S 127.0.0.1:443 -t \"/srv/www\" -c /etc/php/dev.ini'"
        );
    }

    #[test]
    fn test_port_1024_is_the_first_unprivileged_port() {
        assert!(config(1023).needs_elevation());
        assert!(!config(1024).needs_elevation());
    }

    #[test]
    fn test_script_is_a_single_line() {
        let script = build_command(&config(8080), &ElevationTemplate::identity());
        assert_eq!(script.matches('\n').count(), 1);
        assert!(script.ends_with('\n'));
    }
}
