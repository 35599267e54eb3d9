//! Room and user identifiers, and the room rules encoded in a room id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TypesError;

/// Length of generated room and user ids.
pub const ID_LENGTH: usize = 8;

/// Capacity and selections-per-user of a room.
///
/// Both values are packed into the leading decimal digit `d` of a room id:
/// `users_count = d / 3 + 2` and `selections_per_user = d % 3 + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRoomRules", into = "RawRoomRules")]
pub struct RoomRules {
    users_count: usize,
    selections_per_user: usize,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoomRules {
    users_count: usize,
    selections_per_user: usize,
}

impl RoomRules {
    /// Create rules, checking they can be encoded in a single digit.
    pub fn new(users_count: usize, selections_per_user: usize) -> Result<Self, TypesError> {
        if !(1..=3).contains(&selections_per_user) {
            return Err(TypesError::invalid_rules(format!(
                "selections per user must be between 1 and 3, got {}",
                selections_per_user
            )));
        }
        if users_count < 2 {
            return Err(TypesError::invalid_rules(format!(
                "a room needs at least 2 users, got {}",
                users_count
            )));
        }

        match encode_digit(users_count, selections_per_user) {
            Some(_) => Ok(Self {
                users_count,
                selections_per_user,
            }),
            None => Err(TypesError::invalid_rules(format!(
                "{} users with {} selections each cannot be encoded in a room id",
                users_count, selections_per_user
            ))),
        }
    }

    /// Decode the rules from a single decimal digit.
    pub fn from_digit(digit: u32) -> Result<Self, TypesError> {
        if digit > 9 {
            return Err(TypesError::invalid_rules(format!(
                "rule digit must be 0-9, got {}",
                digit
            )));
        }
        let digit = digit as usize;
        Ok(Self {
            users_count: digit / 3 + 2,
            selections_per_user: digit % 3 + 1,
        })
    }

    /// Number of players needed before voting completes.
    pub fn users_count(&self) -> usize {
        self.users_count
    }

    /// Number of cards each player selects.
    pub fn selections_per_user(&self) -> usize {
        self.selections_per_user
    }

    /// The digit a room id must start with to carry these rules.
    pub fn leading_digit(&self) -> char {
        // every constructor checks the encoding, so the fallback is unreachable
        encode_digit(self.users_count, self.selections_per_user)
            .and_then(|digit| char::from_digit(digit as u32, 10))
            .unwrap_or('1')
    }
}

fn encode_digit(users_count: usize, selections_per_user: usize) -> Option<usize> {
    let digit = users_count
        .checked_sub(2)?
        .checked_mul(3)?
        .checked_add(selections_per_user.checked_sub(1)?)?;
    if selections_per_user <= 3 && digit <= 9 {
        Some(digit)
    } else {
        None
    }
}

impl TryFrom<RawRoomRules> for RoomRules {
    type Error = TypesError;

    fn try_from(raw: RawRoomRules) -> Result<Self, Self::Error> {
        Self::new(raw.users_count, raw.selections_per_user)
    }
}

impl From<RoomRules> for RawRoomRules {
    fn from(rules: RoomRules) -> Self {
        Self {
            users_count: rules.users_count,
            selections_per_user: rules.selections_per_user,
        }
    }
}

impl Default for RoomRules {
    /// Two players choosing two cards each, the layout of the first release.
    fn default() -> Self {
        Self {
            users_count: 2,
            selections_per_user: 2,
        }
    }
}

/// A room identifier: an opaque path segment whose leading digit encodes [`RoomRules`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Validate a room id taken from a connection path.
    pub fn parse(value: impl Into<String>) -> Result<Self, TypesError> {
        let value = value.into();
        check_path_segment(&value)
            .map_err(|reason| TypesError::invalid_room_id(value.clone(), reason))?;

        match value.chars().next().and_then(|c| c.to_digit(10)) {
            Some(_) => Ok(Self(value)),
            None => Err(TypesError::invalid_room_id(
                value,
                "the first character must be a decimal digit",
            )),
        }
    }

    /// Generate a fresh room id carrying the given rules.
    pub fn generate(rules: RoomRules) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{}",
            rules.leading_digit(),
            &suffix[..ID_LENGTH - 1]
        ))
    }

    /// Rules encoded in the leading digit.
    pub fn rules(&self) -> RoomRules {
        let digit = self.0.chars().next().and_then(|c| c.to_digit(10)).unwrap_or(0);
        RoomRules::from_digit(digit).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

/// An ephemeral per-connection user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn parse(value: impl Into<String>) -> Result<Self, TypesError> {
        let value = value.into();
        match check_path_segment(&value) {
            Ok(()) => Ok(Self(value)),
            Err(_) => Err(TypesError::InvalidUserId(value)),
        }
    }

    /// Generate a fresh 8 character user id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string()[..ID_LENGTH].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

fn check_path_segment(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err("must not be empty");
    }
    if value.contains('/') {
        return Err("must not contain '/'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_formula_for_every_digit() {
        let expected = [
            (2, 1),
            (2, 2),
            (2, 3),
            (3, 1),
            (3, 2),
            (3, 3),
            (4, 1),
            (4, 2),
            (4, 3),
            (5, 1),
        ];
        for (digit, (users, selections)) in expected.iter().enumerate() {
            let rules = RoomRules::from_digit(digit as u32).unwrap();
            assert_eq!(rules.users_count(), *users, "digit {}", digit);
            assert_eq!(rules.selections_per_user(), *selections, "digit {}", digit);
            assert_eq!(rules.leading_digit().to_digit(10), Some(digit as u32));
        }
    }

    #[test]
    fn test_rules_validation() {
        assert!(RoomRules::new(3, 2).is_ok());
        assert!(RoomRules::new(5, 1).is_ok());
        assert!(RoomRules::new(1, 1).is_err());
        assert!(RoomRules::new(2, 0).is_err());
        assert!(RoomRules::new(2, 4).is_err());
        // 5 users only fit with a single selection
        assert!(RoomRules::new(5, 2).is_err());
        assert!(RoomRules::from_digit(10).is_err());
    }

    #[test]
    fn test_room_id_parse() {
        let room = RoomId::parse("4ab12cd9").unwrap();
        assert_eq!(room.rules(), RoomRules::new(3, 2).unwrap());
        assert_eq!(room.to_string(), "4ab12cd9");

        assert!(RoomId::parse("").is_err());
        assert!(RoomId::parse("abc").is_err());
        assert!(RoomId::parse("1a/b").is_err());
    }

    #[test]
    fn test_room_id_generate_carries_rules() {
        let rules = RoomRules::new(4, 3).unwrap();
        let room = RoomId::generate(rules);
        assert_eq!(room.as_str().len(), ID_LENGTH);
        assert!(room.as_str().starts_with('8'));
        assert_eq!(room.rules(), rules);
        assert_ne!(room, RoomId::generate(rules));
    }

    #[test]
    fn test_user_id_generate() {
        let user = UserId::generate();
        assert_eq!(user.as_str().len(), ID_LENGTH);
        assert!(UserId::parse(user.to_string()).is_ok());
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse("a/b").is_err());
    }

    #[test]
    fn test_room_id_serde_validates() {
        let room: RoomId = serde_json::from_str(r#""0abc""#).unwrap();
        assert_eq!(room.as_str(), "0abc");
        assert!(serde_json::from_str::<RoomId>(r#""xyz""#).is_err());
    }

    #[test]
    fn test_rules_serde_validates() {
        let rules: RoomRules =
            serde_json::from_str(r#"{"usersCount":3,"selectionsPerUser":2}"#).unwrap();
        assert_eq!(rules, RoomRules::new(3, 2).unwrap());
        assert_eq!(
            serde_json::to_value(rules).unwrap(),
            serde_json::json!({"usersCount": 3, "selectionsPerUser": 2})
        );

        for json in [
            r#"{"usersCount":6,"selectionsPerUser":1}"#,
            r#"{"usersCount":1,"selectionsPerUser":1}"#,
            r#"{"usersCount":2,"selectionsPerUser":0}"#,
            r#"{"usersCount":5,"selectionsPerUser":3}"#,
        ] {
            assert!(serde_json::from_str::<RoomRules>(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn test_generated_room_ids_carry_rules_for_every_valid_combination() {
        for users in 2..=5 {
            for selections in 1..=3 {
                if let Ok(rules) = RoomRules::new(users, selections) {
                    assert_eq!(RoomId::generate(rules).rules(), rules);
                }
            }
        }
        assert!(RoomRules::new(usize::MAX, 1).is_err());
    }
}
