//! Settings that accept a value only while they are still blank.

// self
use crate::{_prelude::*, error::ConfigError, secret::TokenSecret};

/// Values that can be blank (empty strings count as "not set").
pub trait Blank {
	/// Returns `true` when the value carries no information.
	fn is_blank(&self) -> bool;
}
impl Blank for String {
	fn is_blank(&self) -> bool {
		self.is_empty()
	}
}
impl Blank for TokenSecret {
	fn is_blank(&self) -> bool {
		self.is_empty()
	}
}

/// Setting that may be written until it holds a non-blank value.
///
/// `Unset → Set` and `Set(blank) → Set` succeed; `Set(non-blank) → Set` fails with
/// [`ConfigError::WriteOnce`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WriteOnce<T> {
	/// No value recorded yet.
	#[default]
	Unset,
	/// A value has been recorded.
	Set(T),
}
impl<T> WriteOnce<T>
where
	T: Blank,
{
	/// Records `value` unless a non-blank value is already present.
	pub fn set(&mut self, field: &'static str, value: T) -> Result<(), ConfigError> {
		if self.get().is_some() {
			return Err(ConfigError::WriteOnce { field });
		}

		*self = Self::Set(value);

		Ok(())
	}

	/// Returns the value when it is set and not blank.
	pub fn get(&self) -> Option<&T> {
		match self {
			Self::Set(value) if !value.is_blank() => Some(value),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn second_non_blank_write_fails() {
		let mut cell = <WriteOnce<String>>::default();

		cell.set("clientId", "A".into()).expect("First write should succeed.");

		let err = cell.set("clientId", "B".into()).expect_err("Second write should be rejected.");

		assert!(matches!(err, ConfigError::WriteOnce { field: "clientId" }));
		assert_eq!(cell.get().map(String::as_str), Some("A"));
	}

	#[test]
	fn blank_values_can_be_replaced() {
		let mut cell = <WriteOnce<String>>::default();

		cell.set("platformId", String::new()).expect("Blank write should succeed.");

		assert_eq!(cell.get(), None);

		cell.set("platformId", "ios".into()).expect("Write over a blank value should succeed.");

		assert_eq!(cell.get().map(String::as_str), Some("ios"));
	}
}
