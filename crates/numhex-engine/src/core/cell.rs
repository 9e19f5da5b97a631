use std::{fmt, str::FromStr};

use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CellIdParseError, CellValueParseError};

/// Arithmetic operator held by an operator cell.
///
/// Operators are applied immediately to the running total while a path is
/// folded, so there is no precedence between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Operator {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("×")]
    Mul,
    #[display("÷")]
    Div,
}

impl Distribution<Operator> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Operator {
        match rng.random_range(0..Operator::LEN) {
            0 => Operator::Add,
            1 => Operator::Sub,
            2 => Operator::Mul,
            _ => Operator::Div,
        }
    }
}

impl Operator {
    /// Number of operators (4).
    pub const LEN: usize = 4;

    /// Operators used to build level targets.
    ///
    /// Division is left out so every target is reachable with whole numbers.
    pub const TARGET_SET: [Self; 3] = [Self::Add, Self::Sub, Self::Mul];

    /// Returns the symbol shown on the board.
    ///
    /// # Examples
    ///
    /// ```
    /// use numhex_engine::Operator;
    ///
    /// assert_eq!(Operator::Mul.as_char(), '×');
    /// assert_eq!(Operator::Div.as_char(), '÷');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '×',
            Operator::Div => '÷',
        }
    }

    /// Parses an operator symbol. ASCII `*` and `/` are accepted as aliases.
    ///
    /// # Examples
    ///
    /// ```
    /// use numhex_engine::Operator;
    ///
    /// assert_eq!(Operator::from_char('×'), Some(Operator::Mul));
    /// assert_eq!(Operator::from_char('/'), Some(Operator::Div));
    /// assert_eq!(Operator::from_char('%'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '×' | '*' => Some(Operator::Mul),
            '÷' | '/' => Some(Operator::Div),
            _ => None,
        }
    }

    /// Applies the operator to the running total.
    ///
    /// Division floors toward negative infinity and leaves `acc` unchanged
    /// when `rhs` is zero. Overflow saturates.
    #[must_use]
    pub fn apply(self, acc: i64, rhs: i64) -> i64 {
        match self {
            Operator::Add => acc.saturating_add(rhs),
            Operator::Sub => acc.saturating_sub(rhs),
            Operator::Mul => acc.saturating_mul(rhs),
            Operator::Div if rhs == 0 => acc,
            Operator::Div => floor_div(acc, rhs),
        }
    }
}

fn floor_div(lhs: i64, rhs: i64) -> i64 {
    let Some(quotient) = lhs.checked_div(rhs) else {
        // i64::MIN / -1
        return i64::MAX;
    };
    if lhs % rhs != 0 && ((lhs < 0) != (rhs < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

/// Kind of a cell, decided by its position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::IsVariant)]
pub enum CellKind {
    #[display("number")]
    Number,
    #[display("operator")]
    Operator,
}

impl CellKind {
    /// Returns the kind assigned to `(row, col)`.
    ///
    /// Cells alternate like a checkerboard: even `row + col` is a number.
    #[must_use]
    pub const fn at(row: u8, col: u8) -> Self {
        if row % 2 == col % 2 {
            CellKind::Number
        } else {
            CellKind::Operator
        }
    }
}

/// Position of a cell, displayed and serialized as `"row-col"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    row: u8,
    col: u8,
}

impl CellId {
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    #[must_use]
    pub const fn row(self) -> u8 {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> u8 {
        self.col
    }

    /// Returns the id shifted by `(d_row, d_col)`, or `None` below zero.
    #[must_use]
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        Some(Self { row, col })
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

impl FromStr for CellId {
    type Err = CellIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s.split_once('-').ok_or_else(|| CellIdParseError::new(s))?;
        let row = row.parse().map_err(|_| CellIdParseError::new(s))?;
        let col = col.parse().map_err(|_| CellIdParseError::new(s))?;
        Ok(Self { row, col })
    }
}

impl Serialize for CellId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Content of a cell, serialized as the symbol shown on the board (`"7"`, `"×"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellValue {
    Number(u8),
    Operator(Operator),
}

impl CellValue {
    #[must_use]
    pub const fn kind(self) -> CellKind {
        match self {
            CellValue::Number(_) => CellKind::Number,
            CellValue::Operator(_) => CellKind::Operator,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Operator(op) => write!(f, "{op}"),
        }
    }
}

impl FromStr for CellValue {
    type Err = CellValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(CellValueParseError::new(s));
        };
        if let Some(digit) = c.to_digit(10).and_then(|d| u8::try_from(d).ok()) {
            return Ok(CellValue::Number(digit));
        }
        Operator::from_char(c)
            .map(CellValue::Operator)
            .ok_or_else(|| CellValueParseError::new(s))
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    id: CellId,
    value: CellValue,
}

impl Cell {
    #[must_use]
    pub const fn new(id: CellId, value: CellValue) -> Self {
        Self { id, value }
    }

    #[must_use]
    pub const fn id(&self) -> CellId {
        self.id
    }

    #[must_use]
    pub const fn value(&self) -> CellValue {
        self.value
    }

    #[must_use]
    pub const fn kind(&self) -> CellKind {
        self.value.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod operator {
        use super::*;

        #[test]
        fn test_division_floors_toward_negative_infinity() {
            assert_eq!(Operator::Div.apply(7, 2), 3);
            assert_eq!(Operator::Div.apply(-7, 2), -4);
            assert_eq!(Operator::Div.apply(-8, 2), -4);
            assert_eq!(Operator::Div.apply(7, -2), -4);
        }

        #[test]
        fn test_division_by_zero_keeps_accumulator() {
            assert_eq!(Operator::Div.apply(42, 0), 42);
            assert_eq!(Operator::Div.apply(-3, 0), -3);
        }

        #[test]
        fn test_overflow_saturates() {
            assert_eq!(Operator::Mul.apply(i64::MAX, 9), i64::MAX);
            assert_eq!(Operator::Div.apply(i64::MIN, -1), i64::MAX);
        }

        #[test]
        fn test_symbols_round_trip() {
            for op in [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div] {
                assert_eq!(Operator::from_char(op.as_char()), Some(op));
                assert_eq!(op.to_string(), op.as_char().to_string());
            }
        }
    }

    mod cell_id {
        use super::*;

        #[test]
        fn test_serialization_format() {
            let id = CellId::new(3, 12);
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"3-12\"");
            let parsed: CellId = serde_json::from_str("\"3-12\"").unwrap();
            assert_eq!(parsed, id);
        }

        #[test]
        fn test_parse_errors() {
            assert!("3".parse::<CellId>().is_err());
            assert!("3-".parse::<CellId>().is_err());
            assert!("a-1".parse::<CellId>().is_err());
            assert!("1-2-3".parse::<CellId>().is_err());
            assert!("-1-2".parse::<CellId>().is_err());
        }

        #[test]
        fn test_offset_stays_non_negative() {
            let id = CellId::new(0, 2);
            assert_eq!(id.offset(-1, 0), None);
            assert_eq!(id.offset(1, -1), Some(CellId::new(1, 1)));
        }
    }

    mod cell_value {
        use super::*;

        #[test]
        fn test_parse_digits_and_operators() {
            assert_eq!("7".parse::<CellValue>(), Ok(CellValue::Number(7)));
            assert_eq!(
                "÷".parse::<CellValue>(),
                Ok(CellValue::Operator(Operator::Div))
            );
            assert!("10".parse::<CellValue>().is_err());
            assert!("".parse::<CellValue>().is_err());
            assert!("%".parse::<CellValue>().is_err());
        }

        #[test]
        fn test_serialization_uses_board_symbol() {
            let value = CellValue::Operator(Operator::Mul);
            assert_eq!(serde_json::to_string(&value).unwrap(), "\"×\"");
        }
    }

    #[test]
    fn test_kind_follows_position_parity() {
        assert_eq!(CellKind::at(0, 0), CellKind::Number);
        assert_eq!(CellKind::at(0, 1), CellKind::Operator);
        assert_eq!(CellKind::at(1, 0), CellKind::Operator);
        assert_eq!(CellKind::at(1, 1), CellKind::Number);
    }
}
