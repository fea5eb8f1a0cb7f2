use core::fmt;

use crate::bytes::ByteSeq;

/// Defines [`Keyword`] from `Variant => "TOKEN"` pairs.
///
/// Each token is stored once in static memory; nothing is encoded at runtime.
macro_rules! define_keywords {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $token:literal
        ),+ $(,)?
    ) => {
        /// Protocol tokens used to build store commands.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[non_exhaustive]
        pub enum Keyword {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl Keyword {
            /// Every keyword, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The upper-case wire token.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }
    };
}

define_keywords! {
    // keys
    Del => "DEL",
    Exists => "EXISTS",
    Expire => "EXPIRE",
    PExpire => "PEXPIRE",
    Ttl => "TTL",
    PTtl => "PTTL",
    Type => "TYPE",
    Scan => "SCAN",
    // strings
    Get => "GET",
    Set => "SET",
    SetNx => "SETNX",
    GetSet => "GETSET",
    MGet => "MGET",
    MSet => "MSET",
    Incr => "INCR",
    IncrBy => "INCRBY",
    IncrByFloat => "INCRBYFLOAT",
    Decr => "DECR",
    DecrBy => "DECRBY",
    // hashes
    HGet => "HGET",
    HSet => "HSET",
    HDel => "HDEL",
    HGetAll => "HGETALL",
    HIncrBy => "HINCRBY",
    // lists
    LPush => "LPUSH",
    RPush => "RPUSH",
    LPop => "LPOP",
    RPop => "RPOP",
    BLPop => "BLPOP",
    LRange => "LRANGE",
    LLen => "LLEN",
    // sets
    SAdd => "SADD",
    SRem => "SREM",
    SMembers => "SMEMBERS",
    // sorted sets
    ZAdd => "ZADD",
    ZRem => "ZREM",
    ZRange => "ZRANGE",
    ZRangeByScore => "ZRANGEBYSCORE",
    ZRemRangeByScore => "ZREMRANGEBYSCORE",
    ZScore => "ZSCORE",
    ZCard => "ZCARD",
    // pub/sub
    Publish => "PUBLISH",
    Subscribe => "SUBSCRIBE",
    PSubscribe => "PSUBSCRIBE",
    Unsubscribe => "UNSUBSCRIBE",
    PUnsubscribe => "PUNSUBSCRIBE",
    // scripting and transactions
    Eval => "EVAL",
    EvalSha => "EVALSHA",
    Script => "SCRIPT",
    Load => "LOAD",
    Multi => "MULTI",
    Exec => "EXEC",
    Watch => "WATCH",
    Unwatch => "UNWATCH",
    // connection
    Ping => "PING",
    Auth => "AUTH",
    Select => "SELECT",
    Info => "INFO",
    Config => "CONFIG",
    // options
    Ex => "EX",
    Px => "PX",
    Nx => "NX",
    Xx => "XX",
    KeepTtl => "KEEPTTL",
    WithScores => "WITHSCORES",
    Limit => "LIMIT",
    Match => "MATCH",
    Count => "COUNT",
}

impl Keyword {
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// The token as a [`ByteSeq`] over static memory. Never allocates.
    #[must_use]
    pub const fn seq(self) -> ByteSeq {
        ByteSeq::from_static(self.as_bytes())
    }

    /// Looks a token up, ignoring ASCII case.
    pub fn from_bytes(token: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_bytes().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Keyword> for ByteSeq {
    fn from(keyword: Keyword) -> Self {
        keyword.seq()
    }
}
