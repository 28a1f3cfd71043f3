use crate::models::ServiceType;

/// Immutable table of service types, loaded once at startup.
///
/// Kept as a `Vec` so iteration order is stable: the recommendation engine
/// relies on it for deterministic tie ordering.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<ServiceType>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServiceType>) -> Self {
        Self { services }
    }

    /// Look up a service type by identifier.
    pub fn get(&self, id: &str) -> Option<&ServiceType> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceType> {
        self.services.iter()
    }

    pub fn services(&self) -> &[ServiceType] {
        &self.services
    }
}

impl Default for ServiceCatalog {
    /// The production service tiers.
    fn default() -> Self {
        Self::new(vec![
            ServiceType {
                id: "van-only".to_string(),
                name: "Van Only".to_string(),
                description: "Self-service van hire with a driver. You load, we drive.".to_string(),
                base_price: 30.0,
                price_per_km: 1.2,
                price_per_hour: Some(25.0),
                included_services: vec!["driver".to_string(), "fuel".to_string()],
                max_volume_m3: 15.0,
                max_weight_kg: 800.0,
                crew_size: 0,
                vehicle_type: "Medium wheelbase van".to_string(),
            },
            ServiceType {
                id: "man-and-van".to_string(),
                name: "Man and Van".to_string(),
                description: "A driver who helps with loading and unloading.".to_string(),
                base_price: 45.0,
                price_per_km: 1.5,
                price_per_hour: Some(35.0),
                included_services: vec![
                    "driver".to_string(),
                    "loading".to_string(),
                    "fuel".to_string(),
                ],
                max_volume_m3: 20.0,
                max_weight_kg: 1000.0,
                crew_size: 1,
                vehicle_type: "Long wheelbase van".to_string(),
            },
            ServiceType {
                id: "two-man-team".to_string(),
                name: "Two Man Team".to_string(),
                description: "Two movers for larger moves and heavy furniture.".to_string(),
                base_price: 75.0,
                price_per_km: 1.8,
                price_per_hour: Some(55.0),
                included_services: vec![
                    "driver".to_string(),
                    "loading".to_string(),
                    "furniture protection".to_string(),
                    "fuel".to_string(),
                ],
                max_volume_m3: 30.0,
                max_weight_kg: 1500.0,
                crew_size: 2,
                vehicle_type: "Luton van with tail lift".to_string(),
            },
            ServiceType {
                id: "premium".to_string(),
                name: "Premium Move".to_string(),
                description: "Full-service move with a three-person crew, packing \
                              materials and insurance cover."
                    .to_string(),
                base_price: 120.0,
                price_per_km: 2.2,
                price_per_hour: Some(85.0),
                included_services: vec![
                    "driver".to_string(),
                    "loading".to_string(),
                    "packing".to_string(),
                    "furniture protection".to_string(),
                    "insurance".to_string(),
                    "fuel".to_string(),
                ],
                max_volume_m3: 50.0,
                max_weight_kg: 2500.0,
                crew_size: 3,
                vehicle_type: "Luton van with tail lift".to_string(),
            },
        ])
    }
}
