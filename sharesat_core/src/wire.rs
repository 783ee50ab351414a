//! The clause wire format used by every global sharing strategy.
//!
//! Per clause: varint `size`, varint `lbd`, `size` signed varints for
//! literals. A payload is prefixed with varint `n_clauses`, varint
//! `total_literals`.

use std::io::Cursor;

use crate::clause::ClauseExchange;
use crate::error;

/// Encodes one clause's body (size, lbd, literals) — no payload framing.
fn encode_clause(buf: &mut Vec<u8>, clause: &ClauseExchange) {
    leb128::write::unsigned(buf, clause.size() as u64).unwrap();
    leb128::write::unsigned(buf, clause.lbd() as u64).unwrap();
    for &lit in clause.literals() {
        leb128::write::signed(buf, lit as i64).unwrap();
    }
}

fn decode_clause(cursor: &mut Cursor<&[u8]>, from: u32) -> Result<ClauseExchange, error::Wire> {
    let size = leb128::read::unsigned(cursor).map_err(|_| error::Wire::Truncated)? as usize;
    let lbd = leb128::read::unsigned(cursor).map_err(|_| error::Wire::Truncated)? as u32;
    if size == 0 {
        return Err(error::Wire::SizeMismatch);
    }
    let mut literals = Vec::with_capacity(size);
    for _ in 0..size {
        let lit = leb128::read::signed(cursor).map_err(|_| error::Wire::Truncated)?;
        literals.push(lit as i32);
    }
    Ok(ClauseExchange::new(literals, lbd, from))
}

/// Encodes a bounded selection of clauses into one payload.
pub fn encode_payload(clauses: &[ClauseExchange]) -> Vec<u8> {
    let mut buf = Vec::new();
    let total_literals: usize = clauses.iter().map(|c| c.size()).sum();
    leb128::write::unsigned(&mut buf, clauses.len() as u64).unwrap();
    leb128::write::unsigned(&mut buf, total_literals as u64).unwrap();
    for clause in clauses {
        encode_clause(&mut buf, clause);
    }
    buf
}

/// Decodes a payload produced by [encode_payload]. `from` is attributed to
/// every decoded clause (the rank the payload was received from, or the
/// producer id if decoding locally).
pub fn decode_payload(bytes: &[u8], from: u32) -> Result<Vec<ClauseExchange>, error::Wire> {
    let mut cursor = Cursor::new(bytes);
    let n_clauses = leb128::read::unsigned(&mut cursor).map_err(|_| error::Wire::Truncated)?;
    let _total_literals = leb128::read::unsigned(&mut cursor).map_err(|_| error::Wire::Truncated)?;
    let mut clauses = Vec::with_capacity(n_clauses as usize);
    for _ in 0..n_clauses {
        clauses.push(decode_clause(&mut cursor, from)?);
    }
    Ok(clauses)
}

/// Encodes clauses into a payload whose `size` bound never exceeds
/// `literal_budget` literals, stopping before exceeding it (callers should
/// already have applied the budget via a database's `give_selection`; this
/// is a defensive re-check for hand-assembled clause lists).
pub fn encode_bounded(clauses: &[ClauseExchange], literal_budget: usize) -> Vec<u8> {
    let mut remaining = literal_budget;
    let mut bounded = Vec::new();
    for clause in clauses {
        if clause.size() > remaining {
            break;
        }
        remaining -= clause.size();
        bounded.push(clause.clone());
    }
    encode_payload(&bounded)
}
