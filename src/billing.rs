// Stay-bill calculator
// Derives a folio total from the stay, the nightly rate, ancillary services and an optional discount.
// The computation is pure and is re-run from scratch whenever any input changes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{Discount, PaymentMethod, PaymentSubmission, ServiceCharge};
use crate::money::{Money, MoneyError, Percentage};
use crate::stay::StayPeriod;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    #[error("Check-out {check_out} is before check-in {check_in}")]
    InvalidStayPeriod {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Amount overflow while computing {0}")]
    Overflow(&'static str),

    #[error("Cash tendered {tendered} does not cover total {total}")]
    InsufficientCash { tendered: Money, total: Money },

    #[error(transparent)]
    Money(#[from] MoneyError),
}

pub type BillingResult<T> = Result<T, BillingError>;

// Everything the calculator needs for one folio
#[derive(Debug, Clone)]
pub struct BillInput<'a> {
    pub stay: StayPeriod,
    pub room_rate: Money,
    pub services: &'a [ServiceCharge],
    pub discount: Option<&'a Discount>,
    // Overtime nights added by staff on top of the scheduled stay
    pub extra_nights: u32,
}

impl<'a> BillInput<'a> {
    pub fn new(stay: StayPeriod, room_rate: Money) -> Self {
        Self {
            stay,
            room_rate,
            services: &[],
            discount: None,
            extra_nights: 0,
        }
    }

    pub fn with_services(mut self, services: &'a [ServiceCharge]) -> Self {
        self.services = services;
        self
    }

    pub fn with_discount(mut self, discount: Option<&'a Discount>) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_extra_nights(mut self, extra_nights: u32) -> Self {
        self.extra_nights = extra_nights;
        self
    }
}

/// Line items and total of a folio. Amounts keep full precision; use [`BillDetails::display`]
/// for the two-decimal figures shown to staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillDetails {
    pub nights: u32,
    pub room_charges: Money,
    pub additional_services_charges: Money,
    pub subtotal: Money,
    pub discount: Money,
    pub discount_percentage: Percentage,
    pub discount_name: Option<String>,
    pub total_amount: Money,
}

impl BillDetails {
    pub fn compute(input: &BillInput<'_>) -> BillingResult<Self> {
        let nights = input
            .stay
            .nights()
            .checked_add(input.extra_nights)
            .ok_or(BillingError::Overflow("nights"))?;

        let room_charges = input
            .room_rate
            .checked_mul(Decimal::from(nights))
            .ok_or(BillingError::Overflow("room charges"))?;

        let additional_services_charges = input
            .services
            .iter()
            .try_fold(Money::ZERO, |acc, service| acc.checked_add(service.price))
            .ok_or(BillingError::Overflow("service charges"))?;

        let subtotal = room_charges
            .checked_add(additional_services_charges)
            .ok_or(BillingError::Overflow("subtotal"))?;

        let (discount, discount_percentage, discount_name) = match input.discount {
            Some(d) => (
                d.percentage
                    .of(subtotal)
                    .ok_or(BillingError::Overflow("discount"))?,
                d.percentage,
                Some(d.name.clone()),
            ),
            None => (Money::ZERO, Percentage::ZERO, None),
        };

        // discount <= subtotal because the percentage is capped at 100
        let total_amount = subtotal.saturating_sub(discount);

        Ok(Self {
            nights,
            room_charges,
            additional_services_charges,
            subtotal,
            discount,
            discount_percentage,
            discount_name,
            total_amount,
        })
    }

    // Copy with every amount rounded to two fraction digits
    pub fn display(&self) -> Self {
        Self {
            nights: self.nights,
            room_charges: self.room_charges.rounded(),
            additional_services_charges: self.additional_services_charges.rounded(),
            subtotal: self.subtotal.rounded(),
            discount: self.discount.rounded(),
            discount_percentage: self.discount_percentage,
            discount_name: self.discount_name.clone(),
            total_amount: self.total_amount.rounded(),
        }
    }

    pub fn change_for(&self, cash_tendered: Money) -> Money {
        change_due(cash_tendered, self.total_amount)
    }

    pub fn is_settled_by(&self, cash_tendered: Money) -> bool {
        cash_tendered >= self.total_amount
    }

    // Payment body for POST /stay_records/:id/payment
    pub fn to_payment(
        &self,
        method: PaymentMethod,
        cash_tendered: Option<Money>,
    ) -> BillingResult<PaymentSubmission> {
        if method == PaymentMethod::Cash {
            if let Some(tendered) = cash_tendered {
                if !self.is_settled_by(tendered) {
                    return Err(BillingError::InsufficientCash {
                        tendered,
                        total: self.total_amount,
                    });
                }
            }
        }

        Ok(PaymentSubmission {
            amount: self.total_amount.rounded(),
            payment_method: method,
            total_service_charges: self.additional_services_charges.rounded(),
            discount_percentage: self.discount_percentage,
            discount_name: self.discount_name.clone(),
        })
    }
}

// Change handed back to the guest; never negative
pub fn change_due(cash_tendered: Money, total: Money) -> Money {
    cash_tendered.saturating_sub(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn stay(check_in: &str, check_out: &str) -> StayPeriod {
        StayPeriod::new(date(check_in), date(check_out)).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn service(id: i64, price: &str) -> ServiceCharge {
        ServiceCharge {
            id,
            name: format!("service-{}", id),
            price: money(price),
        }
    }

    fn discount(percentage: u8) -> Discount {
        Discount {
            id: 1,
            name: format!("{}% off", percentage),
            percentage: Percentage::from_units(percentage).unwrap(),
        }
    }

    #[test]
    fn test_front_desk_example() {
        let services = vec![service(1, "500")];
        let ten_percent = discount(10);
        let input = BillInput::new(stay("2024-01-01", "2024-01-03"), Money::from_units(1000))
            .with_services(&services)
            .with_discount(Some(&ten_percent));

        let bill = BillDetails::compute(&input).unwrap();
        assert_eq!(bill.nights, 2);
        assert_eq!(bill.room_charges, Money::from_units(2000));
        assert_eq!(bill.additional_services_charges, Money::from_units(500));
        assert_eq!(bill.subtotal, Money::from_units(2500));
        assert_eq!(bill.discount, Money::from_units(250));
        assert_eq!(bill.total_amount, Money::from_units(2250));
        assert_eq!(bill.discount_name.as_deref(), Some("10% off"));
        assert_eq!(bill.change_for(Money::from_units(2300)), Money::from_units(50));
    }

    #[test]
    fn test_same_day_stay_bills_one_night() {
        let input = BillInput::new(stay("2024-05-05", "2024-05-05"), Money::from_units(800));
        let bill = BillDetails::compute(&input).unwrap();
        assert_eq!(bill.nights, 1);
        assert_eq!(bill.room_charges, Money::from_units(800));
    }

    #[test_case("0"; "#1 free room")]
    #[test_case("1000.50"; "#2 fractional rate")]
    #[test_case("99999"; "#3 large rate")]
    fn test_room_charges_exact(rate: &str) {
        let input = BillInput::new(stay("2024-01-01", "2024-01-04"), money(rate));
        let bill = BillDetails::compute(&input).unwrap();
        assert_eq!(
            bill.room_charges.amount(),
            money(rate).amount() * Decimal::from(3)
        );
    }

    #[test_case(vec![], None; "#1 no services no discount")]
    #[test_case(vec!["120.25"], Some(0); "#2 one service zero discount")]
    #[test_case(vec!["10", "20.10", "0.99"], Some(50); "#3 many services half off")]
    #[test_case(vec!["75"], Some(100); "#4 full discount")]
    fn test_total_is_subtotal_minus_discount(prices: Vec<&str>, pct: Option<u8>) {
        let services: Vec<ServiceCharge> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| service(i as i64, p))
            .collect();
        let discount = pct.map(discount);
        let input = BillInput::new(stay("2024-03-01", "2024-03-03"), money("150.75"))
            .with_services(&services)
            .with_discount(discount.as_ref());

        let bill = BillDetails::compute(&input).unwrap();
        let expected_services: Money = services.iter().map(|s| s.price).sum();
        assert_eq!(bill.additional_services_charges, expected_services);
        assert_eq!(
            bill.total_amount.amount(),
            bill.room_charges.amount() + bill.additional_services_charges.amount()
                - bill.discount.amount()
        );

        match pct {
            None | Some(0) => {
                assert!(bill.discount.is_zero());
                assert_eq!(bill.total_amount, bill.subtotal);
            }
            Some(100) => assert!(bill.total_amount.is_zero()),
            Some(_) => assert!(bill.total_amount < bill.subtotal),
        }
    }

    #[test]
    fn test_extra_nights_are_billed_at_room_rate() {
        let input = BillInput::new(stay("2024-01-01", "2024-01-03"), Money::from_units(1000))
            .with_extra_nights(1);
        let bill = BillDetails::compute(&input).unwrap();
        assert_eq!(bill.nights, 3);
        assert_eq!(bill.total_amount, Money::from_units(3000));
    }

    #[test_case("2300", "2250", "50"; "#1 cash above total")]
    #[test_case("2250", "2250", "0"; "#2 exact cash")]
    #[test_case("2000", "2250", "0"; "#3 cash below total gives no negative change")]
    fn test_change_due(tendered: &str, total: &str, expected: &str) {
        assert_eq!(change_due(money(tendered), money(total)), money(expected));
    }

    #[test]
    fn test_display_rounding_keeps_internal_precision() {
        let third_off = Discount {
            id: 7,
            name: "Corporate".to_string(),
            percentage: Percentage::from_str("33.333").unwrap(),
        };
        let input = BillInput::new(stay("2024-01-01", "2024-01-02"), money("100"))
            .with_discount(Some(&third_off));

        let bill = BillDetails::compute(&input).unwrap();
        assert_eq!(bill.discount.amount(), Decimal::from_str("33.333").unwrap());

        let shown = bill.display();
        assert_eq!(shown.discount, money("33.33"));
        assert_eq!(shown.total_amount, money("66.67"));
        assert_eq!(shown.total_amount.to_string(), "66.67");
    }

    #[test]
    fn test_payment_rejects_insufficient_cash() {
        let input = BillInput::new(stay("2024-01-01", "2024-01-02"), money("100"));
        let bill = BillDetails::compute(&input).unwrap();

        let result = bill.to_payment(PaymentMethod::Cash, Some(money("99.99")));
        assert!(matches!(
            result,
            Err(BillingError::InsufficientCash { .. })
        ));

        let card = bill.to_payment(PaymentMethod::Card, None).unwrap();
        assert_eq!(card.amount, money("100"));
        assert_eq!(card.discount_name, None);
        assert!(card.discount_percentage.is_zero());
    }

    #[test]
    fn test_overflow_is_reported() {
        let input = BillInput::new(stay("2024-01-01", "2024-01-03"), Money::new(Decimal::MAX).unwrap());
        assert_eq!(
            BillDetails::compute(&input),
            Err(BillingError::Overflow("room charges"))
        );
    }
}
