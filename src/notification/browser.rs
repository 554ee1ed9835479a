use tokio::process::Command;
use uuid::Uuid;

use super::PendingNotifier;

/// Logs each approval URL and opens it in the desktop browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNotifier;

impl PendingNotifier for BrowserNotifier {
    fn notify(&self, id: &Uuid, url: &str) {
        tracing::info!(%id, "transaction pending: {}", url);

        let (program, args) = opener_command(url);
        match Command::new(program).args(&args).kill_on_drop(false).spawn() {
            Ok(mut child) => {
                tokio::spawn(async move {
                    if let Err(e) = child.wait().await {
                        tracing::debug!(error = %e, "browser opener did not exit cleanly");
                    }
                });
            }
            Err(e) => {
                // Not fatal: the page is still reachable by navigating to the URL.
                tracing::warn!(%id, error = %e, "failed to open browser, visit {} manually", url);
            }
        }
    }
}

/// Platform command that opens `url` with the default handler.
pub fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else if cfg!(target_os = "windows") {
        (
            "cmd",
            vec!["/c".into(), "start".into(), String::new(), url.to_string()],
        )
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opener_command_passes_url_last() {
        let (program, args) = opener_command("http://localhost:5173/request/abc");
        assert!(!program.is_empty());
        assert_eq!(args.last().unwrap(), "http://localhost:5173/request/abc");
    }

    #[test]
    fn test_opener_keeps_query_string_intact() {
        let url = "http://localhost:5173/request/abc?chain=1&x=y";
        let (_, args) = opener_command(url);
        assert!(args.iter().any(|a| a == url));
    }
}
