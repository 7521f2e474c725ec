use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

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

#[cfg(test)]
mod tests {
    use super::{GeoPoint, haversine_km};

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 42.3601,
            lng: -71.0589,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn boston_to_providence_is_around_66_km() {
        let boston = GeoPoint {
            lat: 42.3601,
            lng: -71.0589,
        };
        let providence = GeoPoint {
            lat: 41.8240,
            lng: -71.4128,
        };
        let distance = haversine_km(&boston, &providence);
        assert!((distance - 66.0).abs() < 4.0);
    }
}
