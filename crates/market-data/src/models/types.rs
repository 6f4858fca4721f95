/// Quote currency code as supplied by the caller (e.g. "usd")
pub type Currency = String;
