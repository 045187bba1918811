use crate::version::Result;
use chrono::{DateTime, Local};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Side file that suppresses repeated stamping of the same project.
///
/// Each line is `<path>#<rfc3339 timestamp>`. A project stamped less than
/// the configured number of minutes ago is skipped.
pub struct IgnoreList {
    file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreDecision {
    /// Stamped recently, leave the target alone
    Skip { last_stamped: DateTime<Local> },
    /// Window elapsed (or no record); the list has been refreshed
    Proceed,
}

impl IgnoreList {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Check `key` against the list and, unless it is still inside the
    /// window, rewrite its record with `now`.
    pub fn check_and_touch(
        &self,
        key: &str,
        window_minutes: f64,
        now: DateTime<Local>,
    ) -> Result<IgnoreDecision> {
        let contents = match fs::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("Ignore list not found, starting empty");
                String::new()
            }
            Err(err) => return Err(err.into()),
        };

        match refresh(&contents, key, window_minutes, now) {
            Refresh::Skip(last_stamped) => Ok(IgnoreDecision::Skip { last_stamped }),
            Refresh::Rewrite(updated) => {
                if let Some(parent) = self.file_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.file_path, updated)?;
                debug!("Ignore list updated at: {}", self.file_path.display());
                Ok(IgnoreDecision::Proceed)
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Refresh {
    Skip(DateTime<Local>),
    Rewrite(String),
}

fn refresh(contents: &str, key: &str, window_minutes: f64, now: DateTime<Local>) -> Refresh {
    let mut kept = String::new();

    for line in contents.lines().filter(|line| !line.is_empty()) {
        if !line.starts_with(key) {
            kept.push_str(line);
            kept.push('\n');
            continue;
        }

        // Records without a parseable timestamp are treated as expired
        let Some(stamped) = line
            .rsplit_once('#')
            .and_then(|(_, stamp)| DateTime::parse_from_rfc3339(stamp.trim()).ok())
        else {
            continue;
        };

        let stamped = stamped.with_timezone(&Local);
        let elapsed = now.signed_duration_since(stamped).num_seconds() as f64 / 60.0;
        if elapsed < window_minutes {
            debug!("{} stamped {:.1} minutes ago, skipping", key, elapsed);
            return Refresh::Skip(stamped);
        }
    }

    kept.push_str(&format!("{}#{}\n", key, now.to_rfc3339()));
    Refresh::Rewrite(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_refresh_appends_new_record() {
        let now = Local::now();
        let other = format!("/other/#{}\n", now.to_rfc3339());

        match refresh(&other, "/project/", 5.0, now) {
            Refresh::Rewrite(updated) => {
                let lines: Vec<&str> = updated.lines().collect();
                assert_eq!(lines.len(), 2);
                assert!(lines[0].starts_with("/other/#"));
                assert_eq!(lines[1], format!("/project/#{}", now.to_rfc3339()));
            }
            other => panic!("Expected rewrite, got: {:?}", other),
        }
    }

    #[test]
    fn test_refresh_skips_inside_window() {
        let now = Local::now();
        let recent = format!("/project/#{}\n", (now - Duration::minutes(2)).to_rfc3339());

        assert!(matches!(
            refresh(&recent, "/project/", 5.0, now),
            Refresh::Skip(_)
        ));
    }

    #[test]
    fn test_refresh_replaces_expired_record() {
        let now = Local::now();
        let old = format!(
            "/project/#{}\n/other/#x\n",
            (now - Duration::minutes(30)).to_rfc3339()
        );

        match refresh(&old, "/project/", 5.0, now) {
            Refresh::Rewrite(updated) => {
                assert_eq!(updated.matches("/project/#").count(), 1);
                assert!(updated.contains("/other/#x\n"));
                assert!(updated.ends_with(&format!("/project/#{}\n", now.to_rfc3339())));
            }
            other => panic!("Expected rewrite, got: {:?}", other),
        }
    }

    #[test]
    fn test_zero_window_never_skips() {
        let now = Local::now();
        let current = format!("/project/#{}\n", now.to_rfc3339());
        assert!(matches!(
            refresh(&current, "/project/", 0.0, now),
            Refresh::Rewrite(_)
        ));
    }

    #[test]
    fn test_check_and_touch_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let list = IgnoreList::new(temp_dir.path().join("ignoreList.dat"));
        let now = Local::now();

        assert_eq!(
            list.check_and_touch("/project/", 10.0, now).unwrap(),
            IgnoreDecision::Proceed
        );
        assert!(list.file_path().exists());

        let later = now + Duration::minutes(1);
        assert!(matches!(
            list.check_and_touch("/project/", 10.0, later).unwrap(),
            IgnoreDecision::Skip { .. }
        ));

        let much_later = now + Duration::minutes(11);
        assert_eq!(
            list.check_and_touch("/project/", 10.0, much_later).unwrap(),
            IgnoreDecision::Proceed
        );
    }
}
