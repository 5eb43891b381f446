// Billing dialog state for one stay record
// Holds the inputs fetched from the backend, recomputes the bill after every edit, and submits the payment.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    ApiError, Discount, FrontDeskApi, PaymentMethod, PaymentReceipt, ServiceCharge, StayRecord,
};
use crate::billing::{BillDetails, BillInput, BillingError};
use crate::catalog::DiscountCatalog;
use crate::money::Money;
use crate::session::Session;
use crate::stay::{is_overtime, StayPeriod};

#[derive(Error, Debug)]
pub enum FolioError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error("Discount {0} is not in the catalog")]
    UnknownDiscount(i64),

    #[error("Current user may not apply discounts")]
    DiscountNotPermitted,
}

// Everything the bill is derived from
#[derive(Debug, Clone)]
struct FolioInputs {
    stay: StayPeriod,
    room_rate: Money,
    services: Vec<ServiceCharge>,
    discount: Option<Discount>,
    extra_nights: u32,
}

impl FolioInputs {
    fn bill(&self) -> Result<BillDetails, BillingError> {
        let input = BillInput::new(self.stay, self.room_rate)
            .with_services(&self.services)
            .with_discount(self.discount.as_ref())
            .with_extra_nights(self.extra_nights);
        BillDetails::compute(&input)
    }
}

#[derive(Debug, Clone)]
pub struct FolioDraft {
    stay_record: StayRecord,
    inputs: FolioInputs,
    available_discounts: Vec<Discount>,
    checkout_time: NaiveTime,
    bill: BillDetails,
}

impl FolioDraft {
    // Fetch the stay, its services and the discount catalog together; the bill
    // is only built once all three have arrived.
    pub async fn load<A>(
        api: &A,
        catalog: &DiscountCatalog,
        stay_record_id: i64,
        checkout_time: NaiveTime,
    ) -> Result<Self, FolioError>
    where
        A: FrontDeskApi + ?Sized,
    {
        let (stay_record, services, discounts) = futures::try_join!(
            api.stay_record(stay_record_id),
            api.stay_services(stay_record_id),
            catalog.get_or_fetch(api),
        )?;

        debug!(
            "Loaded stay record {} with {} services and {} discounts",
            stay_record_id,
            services.len(),
            discounts.len()
        );

        Self::new(stay_record, services, discounts, checkout_time)
    }

    pub fn new(
        stay_record: StayRecord,
        services: Vec<ServiceCharge>,
        available_discounts: Vec<Discount>,
        checkout_time: NaiveTime,
    ) -> Result<Self, FolioError> {
        let inputs = FolioInputs {
            stay: stay_record.period()?,
            room_rate: stay_record.room_rate,
            services,
            discount: None,
            extra_nights: 0,
        };
        let bill = inputs.bill()?;

        Ok(Self {
            stay_record,
            inputs,
            available_discounts,
            checkout_time,
            bill,
        })
    }

    // Apply an edit and rebuild the bill; on failure the draft is left untouched
    fn update<F>(&mut self, edit: F) -> Result<&BillDetails, FolioError>
    where
        F: FnOnce(&mut FolioInputs) -> Result<(), FolioError>,
    {
        let mut inputs = self.inputs.clone();
        edit(&mut inputs)?;
        let bill = inputs.bill()?;

        self.inputs = inputs;
        self.bill = bill;
        Ok(&self.bill)
    }

    pub fn stay_record(&self) -> &StayRecord {
        &self.stay_record
    }

    pub fn stay(&self) -> StayPeriod {
        self.inputs.stay
    }

    pub fn services(&self) -> &[ServiceCharge] {
        &self.inputs.services
    }

    pub fn available_discounts(&self) -> &[Discount] {
        &self.available_discounts
    }

    pub fn selected_discount(&self) -> Option<&Discount> {
        self.inputs.discount.as_ref()
    }

    pub fn extra_nights(&self) -> u32 {
        self.inputs.extra_nights
    }

    pub fn bill(&self) -> &BillDetails {
        &self.bill
    }

    pub fn set_dates(
        &mut self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<&BillDetails, FolioError> {
        self.update(|inputs| {
            inputs.stay = StayPeriod::new(check_in, check_out)?;
            Ok(())
        })
    }

    pub fn set_room_rate(&mut self, room_rate: Money) -> Result<&BillDetails, FolioError> {
        self.update(|inputs| {
            inputs.room_rate = room_rate;
            Ok(())
        })
    }

    pub fn add_service(&mut self, service: ServiceCharge) -> Result<&BillDetails, FolioError> {
        self.update(|inputs| {
            inputs.services.push(service);
            Ok(())
        })
    }

    // Removes every line with the given id; removing an absent id is not an error
    pub fn remove_service(&mut self, service_id: i64) -> Result<&BillDetails, FolioError> {
        self.update(|inputs| {
            inputs.services.retain(|s| s.id != service_id);
            Ok(())
        })
    }

    pub fn set_services(
        &mut self,
        services: Vec<ServiceCharge>,
    ) -> Result<&BillDetails, FolioError> {
        self.update(|inputs| {
            inputs.services = services;
            Ok(())
        })
    }

    // Select a discount from the loaded catalog, or clear it with None
    pub fn select_discount(
        &mut self,
        session: &Session,
        discount_id: Option<i64>,
    ) -> Result<&BillDetails, FolioError> {
        let discount = match discount_id {
            Some(id) => {
                if !session.can_apply_discounts() {
                    warn!(
                        "User {:?} tried to apply discount {} without permission",
                        session.user_id, id
                    );
                    return Err(FolioError::DiscountNotPermitted);
                }
                let found = self
                    .available_discounts
                    .iter()
                    .find(|d| d.id == id)
                    .cloned()
                    .ok_or(FolioError::UnknownDiscount(id))?;
                Some(found)
            }
            None => None,
        };

        self.update(|inputs| {
            inputs.discount = discount;
            Ok(())
        })
    }

    pub fn set_extra_nights(&mut self, extra_nights: u32) -> Result<&BillDetails, FolioError> {
        self.update(|inputs| {
            inputs.extra_nights = extra_nights;
            Ok(())
        })
    }

    pub fn is_overtime(&self, paid_at: NaiveDateTime) -> bool {
        is_overtime(self.inputs.stay.check_out(), paid_at, self.checkout_time)
    }

    pub fn change_for(&self, cash_tendered: Money) -> Money {
        self.bill.change_for(cash_tendered)
    }

    pub async fn submit<A>(
        &self,
        api: &A,
        method: PaymentMethod,
        cash_tendered: Option<Money>,
    ) -> Result<PaymentReceipt, FolioError>
    where
        A: FrontDeskApi + ?Sized,
    {
        let payment = self.bill.to_payment(method, cash_tendered)?;
        let receipt = api.submit_payment(self.stay_record.id, &payment).await?;

        info!(
            "Payment of {} recorded for stay record {} (room {})",
            payment.amount, self.stay_record.id, self.stay_record.room_number
        );
        Ok(receipt)
    }
}
