//! Minimal DIMACS CNF loader. No compressed-stream support: the upstream
//! loader this is grounded on transparently decodes `.xz` input, but nothing
//! in the fabric's scope needs that, so the dependency is dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug)]
pub enum DimacsError {
    Io(std::io::Error),
    MissingHeader,
    MalformedHeader,
}

impl std::fmt::Display for DimacsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimacsError::Io(e) => write!(f, "I/O error reading DIMACS input: {e}"),
            DimacsError::MissingHeader => write!(f, "DIMACS input has no 'p cnf' header"),
            DimacsError::MalformedHeader => write!(f, "DIMACS 'p cnf' header is malformed"),
        }
    }
}

impl std::error::Error for DimacsError {}

impl From<std::io::Error> for DimacsError {
    fn from(e: std::io::Error) -> Self {
        DimacsError::Io(e)
    }
}

#[derive(Debug)]
pub struct Formula {
    pub var_count: usize,
    pub clauses: Vec<Vec<i32>>,
}

/// Reads a `p cnf <vars> <clauses>` header followed by literal lines (each
/// terminated by a trailing `0`), skipping `c` comment lines.
pub fn load(path: &Path) -> Result<Formula, DimacsError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut var_count = None;
    let mut clauses = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("p cnf") {
            let mut fields = rest.split_whitespace();
            let vars: usize = fields
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or(DimacsError::MalformedHeader)?;
            let _declared_clauses: usize = fields
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or(DimacsError::MalformedHeader)?;
            var_count = Some(vars);
            continue;
        }

        for token in line.split_whitespace() {
            let literal: i32 = token.parse().map_err(|_| DimacsError::MalformedHeader)?;
            if literal == 0 {
                clauses.push(std::mem::take(&mut current));
            } else {
                current.push(literal);
            }
        }
    }

    let var_count = var_count.ok_or(DimacsError::MissingHeader)?;
    if !current.is_empty() {
        clauses.push(current);
    }

    Ok(Formula { var_count, clauses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn loads_a_small_formula() {
        let file = write_temp(b"c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n");
        let formula = load(file.path()).unwrap();
        assert_eq!(formula.var_count, 3);
        assert_eq!(formula.clauses, vec![vec![1, -2], vec![2, 3]]);
    }

    #[test]
    fn missing_header_is_reported() {
        let file = write_temp(b"1 -2 0\n");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, DimacsError::MissingHeader));
    }
}
