use crate::models::location::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, is_valid_coordinate};
    use crate::models::location::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let depot = GeoPoint {
            lat: -6.2088,
            lng: 106.8456,
        };
        assert!(haversine_km(&depot, &depot) < 1e-9);
    }

    #[test]
    fn jakarta_to_bandung_is_around_120_km() {
        let jakarta = GeoPoint {
            lat: -6.2088,
            lng: 106.8456,
        };
        let bandung = GeoPoint {
            lat: -6.9175,
            lng: 107.6191,
        };
        let distance = haversine_km(&jakarta, &bandung);
        assert!((distance - 116.0).abs() < 10.0);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(is_valid_coordinate(90.0, -180.0));
        assert!(!is_valid_coordinate(91.0, 0.0));
        assert!(!is_valid_coordinate(0.0, 180.5));
    }
}
