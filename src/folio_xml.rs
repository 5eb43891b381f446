// Folio receipt export
// A settled folio is handed to accounting as a small XML document.
use chrono::NaiveDate;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::PaymentMethod;
use crate::folio::FolioDraft;
use crate::money::{Money, MoneyError};

#[derive(Error, Debug)]
pub enum FolioXmlError {
    #[error("XML parse error: {0}")]
    XmlParseError(String),

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Invalid amount in {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        source: MoneyError,
    },
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
#[serde(rename = "Folio")]
pub struct XmlFolio {
    #[serde(rename = "@stayRecordId")]
    pub stay_record_id: i64,
    #[serde(rename = "@room")]
    pub room_number: String,
    #[serde(rename = "@guest")]
    pub guest_name: String,
    pub stay: XmlStay,
    pub charges: XmlCharges,
    pub total: XmlAmount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<XmlPayment>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlStay {
    #[serde(rename = "@checkIn")]
    pub check_in: String,
    #[serde(rename = "@checkOut")]
    pub check_out: String,
    #[serde(rename = "@nights")]
    pub nights: u32,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct XmlCharges {
    pub room: XmlRoomCharge,
    pub services: XmlServices,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<XmlDiscount>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlRoomCharge {
    #[serde(rename = "@rate")]
    pub rate: String,
    #[serde(rename = "@amount")]
    pub amount: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlServices {
    #[serde(rename = "@total")]
    pub total: String,
    #[serde(rename = "Service")]
    pub services: Vec<XmlService>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlService {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@amount")]
    pub amount: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlDiscount {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@percentage")]
    pub percentage: String,
    #[serde(rename = "@amount")]
    pub amount: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlAmount {
    #[serde(rename = "@amount")]
    pub amount: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlPayment {
    #[serde(rename = "@method")]
    pub method: String,
    #[serde(rename = "@tendered", skip_serializing_if = "Option::is_none")]
    pub tendered: Option<String>,
    #[serde(rename = "@change", skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
}

// What accounting needs back out of a receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub stay_record_id: i64,
    pub check_out: NaiveDate,
    pub total: Money,
    pub payment_method: Option<String>,
}

impl XmlFolio {
    pub fn from_folio(
        folio: &FolioDraft,
        method: Option<PaymentMethod>,
        cash_tendered: Option<Money>,
    ) -> Self {
        let record = folio.stay_record();
        let bill = folio.bill().display();

        let services = folio
            .services()
            .iter()
            .map(|s| XmlService {
                id: s.id,
                name: s.name.clone(),
                amount: s.price.to_string(),
            })
            .collect();

        let discount = folio.selected_discount().map(|d| XmlDiscount {
            name: d.name.clone(),
            percentage: d.percentage.value().to_string(),
            amount: bill.discount.to_string(),
        });

        let payment = method.map(|method| XmlPayment {
            method: method.as_str().to_string(),
            tendered: cash_tendered.map(|c| c.to_string()),
            change: cash_tendered.map(|c| folio.change_for(c).to_string()),
        });

        XmlFolio {
            stay_record_id: record.id,
            room_number: record.room_number.clone(),
            guest_name: record.guest_name.clone(),
            stay: XmlStay {
                check_in: folio.stay().check_in().to_string(),
                check_out: folio.stay().check_out().to_string(),
                nights: bill.nights,
            },
            charges: XmlCharges {
                room: XmlRoomCharge {
                    rate: record.room_rate.to_string(),
                    amount: bill.room_charges.to_string(),
                },
                services: XmlServices {
                    total: bill.additional_services_charges.to_string(),
                    services,
                },
                discount,
            },
            total: XmlAmount {
                amount: bill.total_amount.to_string(),
            },
            payment,
        }
    }

    pub fn to_xml(&self) -> Result<String, FolioXmlError> {
        quick_xml::se::to_string(self).map_err(|e| FolioXmlError::ConversionError(e.to_string()))
    }

    pub fn parse(xml: &str) -> Result<Self, FolioXmlError> {
        from_str(xml).map_err(|e| FolioXmlError::XmlParseError(e.to_string()))
    }

    pub fn summary(&self) -> Result<ReceiptSummary, FolioXmlError> {
        let check_out = NaiveDate::parse_from_str(&self.stay.check_out, "%Y-%m-%d")
            .map_err(|e| FolioXmlError::ConversionError(e.to_string()))?;
        let total = self
            .total
            .amount
            .parse::<Money>()
            .map_err(|source| FolioXmlError::InvalidAmount {
                field: "Total",
                source,
            })?;

        Ok(ReceiptSummary {
            stay_record_id: self.stay_record_id,
            check_out,
            total,
            payment_method: self.payment.as_ref().map(|p| p.method.clone()),
        })
    }
}
