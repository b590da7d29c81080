use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    BID,
    ASK
}

impl Side {
    /// Side a signed wire amount belongs to: positive is bid liquidity, everything else ask.
    pub fn from_amount(amount: f64) -> Self {
        if amount > 0.0 { Side::BID } else { Side::ASK }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::BID => Side::ASK,
            Side::ASK => Side::BID,
        }
    }
}

// Aggregated resting liquidity at one price. `size` keeps the wire sign (asks negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
    pub order_count: u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionStatus {
    Snapshot,
    New,
    Update,
    Closed,
    Other(String),
}

impl PositionStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "ps" => PositionStatus::Snapshot,
            "pn" => PositionStatus::New,
            "pu" => PositionStatus::Update,
            "pc" => PositionStatus::Closed,
            other => PositionStatus::Other(other.to_string()),
        }
    }

    pub fn is_closed(&self) -> bool {
        *self == PositionStatus::Closed
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Snapshot => write!(f, "SNAPSHOT"),
            PositionStatus::New => write!(f, "NEW"),
            PositionStatus::Update => write!(f, "ACTIVE"),
            PositionStatus::Closed => write!(f, "CLOSED"),
            PositionStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    Snapshot,
    New,
    Update,
    Closed,
    Other(String),
}

impl OrderStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "os" => OrderStatus::Snapshot,
            "on" => OrderStatus::New,
            "ou" => OrderStatus::Update,
            "oc" => OrderStatus::Closed,
            other => OrderStatus::Other(other.to_string()),
        }
    }

    pub fn is_closed(&self) -> bool {
        *self == OrderStatus::Closed
    }
}

// Open position as reported by the account channel
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub size: f64,
    pub entry_price: f64,
    pub status: PositionStatus
}

impl Position {
    pub fn side(&self) -> Side {
        Side::from_amount(self.size)
    }

    pub fn base_value(&self) -> f64 {
        self.size * self.entry_price
    }
}

// Working order as reported by the account channel
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub symbol: String,
    pub order_type: String,
    pub orig_size: f64,
    pub remaining_size: f64,
    pub price: f64,
    pub avg_price: f64
}
