//! Parser for social graph fixture files.
//!
//! This module handles the `::`-delimited .dat files:
//! - users.dat: userId::username::displayName::verified::followers::following::moments[::avatar[::lat,lon]]
//! - follows.dat / blocks.dat / mutes.dat: fromUserId::toUserId
//!
//! Empty lines and lines starting with `#` are skipped. An empty avatar or
//! location field means "not set".

use crate::error::{GraphLoadError, Result};
use crate::types::*;
use std::fs;
use std::path::Path;

const FIELD_SEPARATOR: &str = "::";

/// Read a fixture file into trimmed, numbered, non-comment lines.
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GraphLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => GraphLoadError::IoError(e),
    })?;

    Ok(content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn parse_error(file: &str, line: usize, reason: impl Into<String>) -> GraphLoadError {
    GraphLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: reason.into(),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str, file: &str, line: usize) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| parse_error(file, line, format!("Invalid {}: {}", field, e)))
}

fn parse_verified(s: &str) -> Result<bool> {
    match s {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(GraphLoadError::InvalidValue {
            field: "verified".to_string(),
            value: s.to_string(),
        }),
    }
}

fn parse_location(s: &str, file: &str, line: usize) -> Result<Option<GeoPoint>> {
    if s.is_empty() {
        return Ok(None);
    }
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| parse_error(file, line, "Location must be lat,lon"))?;
    let lat: f64 = parse_number(lat.trim(), "latitude", file, line)?;
    let lon: f64 = parse_number(lon.trim(), "longitude", file, line)?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(GraphLoadError::InvalidValue {
            field: "location".to_string(),
            value: s.to_string(),
        });
    }
    Ok(Some(GeoPoint::new(lat, lon)))
}

/// Parse the users.dat file
pub fn parse_users(path: &Path) -> Result<Vec<UserProfile>> {
    let file = file_name(path);
    let mut users = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if parts.len() < 7 || parts.len() > 9 {
            return Err(parse_error(
                &file,
                line_no,
                format!("Expected 7 to 9 fields, found {}", parts.len()),
            ));
        }

        let username = parts[1].trim();
        if username.is_empty() {
            return Err(parse_error(&file, line_no, "Missing username"));
        }

        let avatar_url = parts
            .get(7)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let location = match parts.get(8) {
            Some(raw) => parse_location(raw.trim(), &file, line_no)?,
            None => None,
        };

        users.push(UserProfile {
            id: parse_number(parts[0].trim(), "userId", &file, line_no)?,
            username: username.to_string(),
            display_name: parts[2].trim().to_string(),
            verified: parse_verified(parts[3].trim())?,
            follower_count: parse_number(parts[4].trim(), "followers", &file, line_no)?,
            following_count: parse_number(parts[5].trim(), "following", &file, line_no)?,
            moment_count: parse_number(parts[6].trim(), "moments", &file, line_no)?,
            avatar_url,
            location,
        });
    }

    Ok(users)
}

/// Parse an edge file (follows.dat, blocks.dat, mutes.dat)
///
/// A missing edge file is not an error: the graph simply has no edges of
/// that kind.
pub fn parse_edges(path: &Path) -> Result<Vec<Edge>> {
    if !path.exists() {
        tracing::debug!("Edge file {} not present, treating as empty", path.display());
        return Ok(Vec::new());
    }

    let file = file_name(path);
    let mut edges = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let (from, to) = line
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| parse_error(&file, line_no, "Expected fromUserId::toUserId"))?;

        edges.push(Edge {
            from: parse_number(from.trim(), "fromUserId", &file, line_no)?,
            to: parse_number(to.trim(), "toUserId", &file, line_no)?,
        });
    }

    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_fixture(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("graph-loader-parser-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_users_full_and_minimal_rows() {
        let path = write_fixture(
            "users_ok.dat",
            "# id::username::display::verified::followers::following::moments::avatar::loc\n\
             1::alice::Alice Liddell::1::1200::300::45::https://cdn.example/a.png::51.5,-0.12\n\
             2::bob::Bob::0::10::20::3\n\
             \n\
             3::carol::Carol::false::0::0::0::::\n",
        );

        let users = parse_users(&path).unwrap();
        assert_eq!(users.len(), 3);

        assert_eq!(users[0].username, "alice");
        assert!(users[0].verified);
        assert_eq!(users[0].follower_count, 1200);
        assert_eq!(users[0].avatar_url.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(users[0].location, Some(GeoPoint::new(51.5, -0.12)));

        assert!(!users[1].verified);
        assert!(users[1].avatar_url.is_none());
        assert!(users[1].location.is_none());

        assert!(users[2].avatar_url.is_none());
        assert!(users[2].location.is_none());
    }

    #[test]
    fn test_parse_users_reports_line_number() {
        let path = write_fixture("users_bad.dat", "1::alice::Alice::1::10::10::1\n2::bob::Bob::1::ten::10::1\n");

        match parse_users(&path) {
            Err(GraphLoadError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_users_rejects_bad_location() {
        let path = write_fixture("users_loc.dat", "1::alice::Alice::1::10::10::1::::123.0,0.0\n");
        assert!(matches!(
            parse_users(&path),
            Err(GraphLoadError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_edges() {
        let path = write_fixture("follows.dat", "1::2\n2::1\n# comment\n3 :: 1\n");
        let edges = parse_edges(&path).unwrap();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2], Edge { from: 3, to: 1 });
    }

    #[test]
    fn test_missing_edge_file_is_empty() {
        let path = std::env::temp_dir().join("graph-loader-definitely-missing.dat");
        assert!(parse_edges(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_users_file_is_error() {
        let path = std::env::temp_dir().join("graph-loader-missing-users.dat");
        assert!(matches!(
            parse_users(&path),
            Err(GraphLoadError::FileNotFound { .. })
        ));
    }
}
