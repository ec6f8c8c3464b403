use chrono::Utc;
use ethers::types::U256;
use ethers::utils::format_ether;
use proptest::prelude::*;
use transactions_client::core::units::{
    format_timestamp, parse_amount, to_display_amount, to_hex_quantity,
};
use transactions_client::core::{FormField, RawTransaction, TransactionFormData, TransactionRecord};

proptest! {
    #[test]
    fn base_units_survive_format_and_parse(wei in any::<u128>()) {
        let base_units = U256::from(wei);
        let parsed = parse_amount(&format_ether(base_units)).unwrap();
        prop_assert_eq!(parsed, base_units);
    }

    #[test]
    fn decimal_amount_displays_as_entered(
        whole in "0|[1-9][0-9]{0,11}",
        fraction in "[0-9]{0,18}",
    ) {
        let amount = if fraction.is_empty() { whole } else { format!("{}.{}", whole, fraction) };
        let expected: f64 = amount.parse().unwrap();

        let displayed = to_display_amount(parse_amount(&amount).unwrap());

        prop_assert!(
            (displayed - expected).abs() <= expected.abs() * f64::EPSILON,
            "{} displayed as {}", amount, displayed
        );
    }

    #[test]
    fn hex_quantity_is_minimal_hex(value in any::<u64>()) {
        let hex = to_hex_quantity(U256::from(value));
        prop_assert!(hex.starts_with("0x"));
        prop_assert_eq!(u64::from_str_radix(&hex[2..], 16).unwrap(), value);
        prop_assert!(value == 0 || !hex[2..].starts_with('0'));
    }

    #[test]
    fn form_fields_store_any_text(value in ".*") {
        let mut form = TransactionFormData::default();
        for field in [FormField::AddressTo, FormField::Amount, FormField::Keyword, FormField::Message] {
            form.set(field, value.clone());
            prop_assert_eq!(form.get(field), value.as_str());
        }
    }

    #[test]
    fn record_keeps_text_fields(
        receiver in "0x[0-9a-f]{40}",
        message in ".{0,64}",
        keyword in "[a-z]{0,16}",
        seconds in 0u64..4_102_444_800u64,
    ) {
        let raw = RawTransaction {
            sender: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            receiver: receiver.clone(),
            amount: U256::zero(),
            message: message.clone(),
            timestamp: U256::from(seconds),
            keyword: keyword.clone(),
        };
        let record = TransactionRecord::from_raw(&raw, &Utc);
        prop_assert_eq!(record.address_to, receiver);
        prop_assert_eq!(record.message, message);
        prop_assert_eq!(record.keyword, keyword);
        prop_assert_eq!(record.amount, 0.0);
        prop_assert_eq!(record.timestamp.split('/').count(), 3);
    }

    #[test]
    fn timestamp_formatting_never_panics(seconds in any::<u128>()) {
        let formatted = format_timestamp(U256::from(seconds), &Utc);
        prop_assert!(!formatted.is_empty());
    }
}
