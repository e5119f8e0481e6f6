use crate::error::AppError;
use crate::geo::is_valid_coordinate;
use crate::models::delivery::DeliveryPayload;
use crate::models::driver::{DriverUpdate, NewDriver};

fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_new_driver(driver: &NewDriver) -> Result<(), AppError> {
    required("fullname", &driver.fullname)?;
    required("username", &driver.username)?;
    required("phone", &driver.phone)?;
    required("password", &driver.password)?;
    Ok(())
}

/// A blank password on edit means "keep the current one".
pub fn validate_driver_update(update: &mut DriverUpdate) -> Result<(), AppError> {
    required("fullname", &update.fullname)?;
    required("username", &update.username)?;
    required("phone", &update.phone)?;

    if update
        .password
        .as_deref()
        .is_some_and(|password| password.trim().is_empty())
    {
        update.password = None;
    }
    Ok(())
}

pub fn validate_delivery(delivery: &DeliveryPayload) -> Result<(), AppError> {
    required("title", &delivery.title)?;
    required("destination.address", &delivery.destination.address)?;

    match (delivery.destination.latitude, delivery.destination.longitude) {
        (Some(lat), Some(lng)) if !is_valid_coordinate(lat, lng) => {
            return Err(AppError::BadRequest(format!(
                "destination coordinates out of range: {lat}, {lng}"
            )));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(AppError::BadRequest(
                "destination needs both latitude and longitude".to_string(),
            ));
        }
        _ => {}
    }

    for (index, item) in delivery.items.iter().enumerate() {
        required(&format!("items[{index}].name"), &item.name)?;
        if item.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "items[{index}].quantity must be > 0"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_delivery, validate_driver_update, validate_new_driver};
    use crate::error::AppError;
    use crate::models::delivery::{DeliveryItem, DeliveryPayload, Destination};
    use crate::models::driver::{DriverUpdate, NewDriver};

    fn payload() -> DeliveryPayload {
        DeliveryPayload {
            title: "Frozen goods".to_string(),
            description: String::new(),
            destination: Destination {
                address: "Cold storage 2".to_string(),
                latitude: Some(-6.2),
                longitude: Some(106.8),
            },
            items: vec![DeliveryItem {
                name: "ice cream".to_string(),
                quantity: 4,
            }],
        }
    }

    #[test]
    fn new_driver_requires_password() {
        let driver = NewDriver {
            fullname: "Agus".to_string(),
            username: "agus".to_string(),
            phone: "0812".to_string(),
            password: "   ".to_string(),
            role: "driver".to_string(),
        };
        let err = validate_new_driver(&driver).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "password is required"));
    }

    #[test]
    fn blank_password_on_update_is_dropped() {
        let mut update = DriverUpdate {
            fullname: "Agus".to_string(),
            username: "agus".to_string(),
            phone: "0812".to_string(),
            password: Some(String::new()),
        };
        validate_driver_update(&mut update).unwrap();
        assert!(update.password.is_none());
    }

    #[test]
    fn delivery_rules() {
        assert!(validate_delivery(&payload()).is_ok());

        let mut missing_address = payload();
        missing_address.destination.address = " ".to_string();
        assert!(validate_delivery(&missing_address).is_err());

        let mut half_coordinates = payload();
        half_coordinates.destination.longitude = None;
        assert!(validate_delivery(&half_coordinates).is_err());

        let mut empty_item = payload();
        empty_item.items[0].quantity = 0;
        assert!(validate_delivery(&empty_item).is_err());

        let mut off_planet = payload();
        off_planet.destination.latitude = Some(120.0);
        assert!(validate_delivery(&off_planet).is_err());
    }
}
