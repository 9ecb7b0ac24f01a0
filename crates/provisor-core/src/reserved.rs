//! Oracle reserved words
//!
//! The table is versioned data: adding or removing an entry changes which
//! account names [`crate::ident::needs_quoting`] accepts unquoted.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Oracle SQL reserved words plus the keywords commonly rejected as
/// unquoted identifiers. Entries are uppercase.
pub const ORACLE_RESERVED_WORDS: &[&str] = &[
    "ACCESS", "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "AUDIT",
    "BETWEEN", "BY",
    "CHAR", "CHECK", "CLUSTER", "COLUMN", "COMMENT", "COMPRESS", "CONNECT", "CREATE", "CURRENT",
    "DATE", "DECIMAL", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
    "ELSE", "EXCLUSIVE", "EXISTS",
    "FILE", "FLOAT", "FOR", "FROM",
    "GRANT", "GROUP",
    "HAVING",
    "IDENTIFIED", "IMMEDIATE", "IN", "INCREMENT", "INDEX", "INITIAL", "INSERT", "INTEGER",
    "INTERSECT", "INTO", "IS",
    "LEVEL", "LIKE", "LOCK", "LONG",
    "MAXEXTENTS", "MINUS", "MLSLABEL", "MODE", "MODIFY",
    "NOAUDIT", "NOCOMPRESS", "NOT", "NOWAIT", "NULL", "NUMBER",
    "OF", "OFFLINE", "ON", "ONLINE", "OPTION", "OR", "ORDER",
    "PCTFREE", "PRIOR", "PRIVILEGES", "PUBLIC",
    "RAW", "RENAME", "RESOURCE", "REVOKE", "ROW", "ROWID", "ROWNUM", "ROWS",
    "SELECT", "SESSION", "SET", "SHARE", "SIZE", "SMALLINT", "START", "SUCCESSFUL", "SYNONYM",
    "SYSDATE",
    "TABLE", "THEN", "TO", "TRIGGER",
    "UID", "UNION", "UNIQUE", "UPDATE", "USER",
    "VALIDATE", "VALUES", "VARCHAR", "VARCHAR2", "VIEW",
    "WHENEVER", "WHERE", "WITH",
    // PL/SQL and type keywords
    "ANALYZE", "ARCHIVE",
    "BINARY_DOUBLE", "BINARY_FLOAT", "BLOB",
    "CLOB", "CONTINUE", "CURSOR",
    "DATABASE", "DATAFILE", "DUMP",
    "EXCEPTION", "EXIT",
    "FLOAT4", "FLOAT8",
    "INDICATOR",
    "LANGUAGE", "LARGE", "LONGRAW",
    "MATERIALIZED",
    "NCHAR", "NCLOB", "NESTED_TABLE", "NROWID", "NVARCHAR2",
    "PACKAGE", "PRAGMA", "PROCEDURE",
    "REPLACE", "RETURN",
    "SAMPLE", "SEQUENCE",
    "TABLESPACE", "TYPE",
    "UNDER", "UNLIMITED",
    "VALUE", "VARRAY",
    "XMLTYPE",
];

static RESERVED: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ORACLE_RESERVED_WORDS.iter().copied().collect());

/// Returns true when `word` (already upper-cased) is reserved.
pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(word)
}
