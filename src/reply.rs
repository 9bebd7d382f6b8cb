//! Reply writer for the host's text protocol.
//!
//! Generalizes a RESP-style reply enum with the frames the ACL admin
//! surface needs that a plain bulk/array split conflates: a distinct
//! null bulk string (vs. an empty array) and a map type for
//! `ACL GETUSER`.

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `+OK\r\n`-style simple status string.
    Simple(String),
    /// `-ERR ...\r\n`-style error string.
    Error(String),
    /// A present or absent bulk string.
    Bulk(Option<Vec<u8>>),
    /// Shorthand for `Bulk(None)` call sites that want to be explicit
    /// about returning a null reply (e.g. `WHOAMI` with no bound user).
    NullBulk,
    Array(Vec<Reply>),
    /// An ordered field/value map, as returned by `ACL GETUSER`.
    Map(Vec<(String, Reply)>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    pub fn bulk(s: impl Into<Vec<u8>>) -> Self {
        Reply::Bulk(Some(s.into()))
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    pub fn array_of_bulks<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        Reply::Array(items.into_iter().map(Reply::bulk).collect())
    }

    /// Flatten `Map` into the host protocol's wire representation,
    /// which (like RESP2) sends maps as a flat field/value array.
    pub fn into_wire_frame(self) -> Reply {
        match self {
            Reply::Map(pairs) => {
                let mut flat = Vec::with_capacity(pairs.len() * 2);
                for (k, v) in pairs {
                    flat.push(Reply::bulk(k));
                    flat.push(v.into_wire_frame());
                }
                Reply::Array(flat)
            }
            Reply::NullBulk => Reply::Bulk(None),
            Reply::Array(items) => {
                Reply::Array(items.into_iter().map(Reply::into_wire_frame).collect())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_flattens_to_field_value_array() {
        let map = Reply::Map(vec![
            ("flags".to_string(), Reply::bulk("on")),
            ("passwords".to_string(), Reply::Array(vec![])),
        ]);
        let wire = map.into_wire_frame();
        match wire {
            Reply::Array(items) => assert_eq!(items.len(), 4),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn null_bulk_shorthand_matches_bulk_none() {
        assert_eq!(Reply::NullBulk.into_wire_frame(), Reply::Bulk(None));
    }
}
