// src/services/pricing.rs
//
// Walk-through quote calculator. Single pass over the request; the combined
// minimum and fixed-budget steps revise the Moving line produced first, so
// the order of steps below is significant.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::quote_request::{
    DistanceData, DistanceLeg, JunkRemovalAmount, LocationDetails, LocationType, MoveQuoteRequest,
    PackingLevel, ParkingDistance, ServiceType, SpecialItems,
};

pub const MOVING: &str = "Moving";
pub const LABOR: &str = "Loading/Unloading Labor";
pub const MATERIALS: &str = "Materials & Supplies (5%)";
pub const TRAVEL: &str = "Travel";
pub const STAIRS: &str = "Stairs";
pub const PACKING: &str = "Packing";
pub const PACKING_LABOR: &str = "Packing Labor";
pub const PACKING_MATERIALS: &str = "Packing Materials (20%)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub truck_sqft_rate: f64,
    pub labor_only_sqft_rate: f64,
    pub storage_unit_sqft_rate: f64,
    pub truck_pod_foot_rate: f64,
    pub mover_hourly_rate: f64,
    pub truck_labor_minimum: f64,
    pub labor_only_minimum: f64,
    pub materials_rate: f64,
    pub parking_medium_surcharge: f64,
    pub parking_far_surcharge: f64,
    pub free_miles: f64,
    pub truck_mile_rate: f64,
    pub labor_only_mile_rate: f64,
    pub travel_hourly_rate: f64,
    pub travel_minimum: f64,
    pub stairs_per_level: f64,
    pub junk_small: f64,
    pub junk_medium: f64,
    pub junk_large: f64,
    pub junk_full_load: f64,
    pub junk_bundle_discount: f64,
    pub packing_a_few: f64,
    pub packing_moderate_sqft_rate: f64,
    pub packing_quite_a_bit_sqft_rate: f64,
    pub packing_lots_sqft_rate: f64,
    pub packing_materials_rate: f64,
    pub combined_minimum: f64,
    pub budget_minimum_crew: u32,
    pub budget_minimum_hours: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            truck_sqft_rate: 0.80,
            labor_only_sqft_rate: 0.60,
            storage_unit_sqft_rate: 5.00,
            truck_pod_foot_rate: 30.00,
            mover_hourly_rate: 85.0,
            truck_labor_minimum: 100.0,
            labor_only_minimum: 170.0,
            materials_rate: 0.05,
            parking_medium_surcharge: 0.10,
            parking_far_surcharge: 0.20,
            free_miles: 15.0,
            truck_mile_rate: 2.00,
            labor_only_mile_rate: 1.00,
            travel_hourly_rate: 120.0,
            travel_minimum: 100.0,
            stairs_per_level: 50.0,
            junk_small: 150.0,
            junk_medium: 300.0,
            junk_large: 500.0,
            junk_full_load: 800.0,
            junk_bundle_discount: 0.20,
            packing_a_few: 150.0,
            packing_moderate_sqft_rate: 0.15,
            packing_quite_a_bit_sqft_rate: 0.30,
            packing_lots_sqft_rate: 0.45,
            packing_materials_rate: 0.20,
            combined_minimum: 510.0,
            budget_minimum_crew: 2,
            budget_minimum_hours: 1.0,
        }
    }
}

impl PricingConfig {
    pub fn labor_minimum(&self, service: ServiceType) -> f64 {
        match service {
            ServiceType::Truck => self.truck_labor_minimum,
            ServiceType::LaborOnly => self.labor_only_minimum,
        }
    }

    fn sqft_rate(&self, service: ServiceType) -> f64 {
        match service {
            ServiceType::Truck => self.truck_sqft_rate,
            ServiceType::LaborOnly => self.labor_only_sqft_rate,
        }
    }

    fn mile_rate(&self, service: ServiceType) -> f64 {
        match service {
            ServiceType::Truck => self.truck_mile_rate,
            ServiceType::LaborOnly => self.labor_only_mile_rate,
        }
    }

    fn parking_surcharge(&self, parking: ParkingDistance) -> f64 {
        match parking {
            ParkingDistance::Close => 0.0,
            ParkingDistance::Medium => self.parking_medium_surcharge,
            ParkingDistance::Far => self.parking_far_surcharge,
        }
    }

    /// Smallest crew for the smallest job a fixed budget may buy.
    pub fn budget_minimum_labor(&self) -> f64 {
        self.budget_minimum_crew as f64 * self.budget_minimum_hours * self.mover_hourly_rate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineItem {
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<QuoteLineItem>,
}

impl QuoteLineItem {
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        QuoteLineItem {
            description: description.into(),
            amount: round_cents(amount.max(0.0)),
            discount: None,
            alert: None,
            sub_items: Vec::new(),
        }
    }

    /// Parent whose amount is the sum of its (already rounded) sub-items.
    pub fn with_sub_items(description: impl Into<String>, sub_items: Vec<QuoteLineItem>) -> Self {
        let amount = round_cents(sub_items.iter().map(|s| s.amount).sum());
        QuoteLineItem {
            description: description.into(),
            amount,
            discount: None,
            alert: None,
            sub_items,
        }
    }

    pub fn discount(mut self, label: impl Into<String>) -> Self {
        self.discount = Some(label.into());
        self
    }

    pub fn alert(mut self, message: impl Into<String>) -> Self {
        self.alert = Some(message.into());
        self
    }

    pub fn sub_item(&self, description: &str) -> Option<&QuoteLineItem> {
        self.sub_items.iter().find(|s| s.description == description)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCheck {
    pub requested: bool,
    pub insufficient: bool,
    /// Smallest budget that covers every other line plus a minimum crew.
    pub minimum_budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub items: Vec<QuoteLineItem>,
    pub total: f64,
    pub budget: BudgetCheck,
}

impl Quote {
    pub fn item(&self, description: &str) -> Option<&QuoteLineItem> {
        self.items.iter().find(|i| i.description == description)
    }

    pub fn labor(&self) -> f64 {
        self.item(MOVING)
            .and_then(|m| m.sub_item(LABOR))
            .map(|l| l.amount)
            .unwrap_or(0.0)
    }

    pub fn alerts(&self) -> Vec<&str> {
        self.items.iter().filter_map(|i| i.alert.as_deref()).collect()
    }

    /// Message shown to the customer when the requested budget is too small.
    pub fn budget_warning(&self) -> Option<String> {
        if !self.budget.insufficient {
            return None;
        }
        self.budget.minimum_budget.map(|minimum| {
            format!(
                "A fixed budget must be at least ${:.2} to cover the minimum crew plus the other charges.",
                minimum
            )
        })
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts the "how full" slider into a volume multiplier.
///
/// 0-80 scales to 0-100% (a normally furnished home at 80), 80-100 scales
/// to 100-120% for overloaded homes.
pub fn how_full_factor(how_furnished: f64) -> f64 {
    let pct = if how_furnished.is_finite() {
        how_furnished.clamp(0.0, 100.0)
    } else {
        0.0
    };
    if pct <= 80.0 {
        pct / 80.0
    } else {
        1.0 + (pct - 80.0) / 100.0
    }
}

fn location_labor(location: &LocationDetails, service: ServiceType, config: &PricingConfig) -> f64 {
    let factor = how_full_factor(location.how_furnished);
    match location.location_type {
        Some(LocationType::House) | Some(LocationType::Apartment) | Some(LocationType::Business) => {
            location.square_feet() * factor * config.sqft_rate(service)
        }
        Some(LocationType::StorageUnit) => {
            location.storage_unit_square_feet * factor * config.storage_unit_sqft_rate
        }
        Some(LocationType::UnloadingTruckPod) => {
            location.truck_pod_length_feet * factor * config.truck_pod_foot_rate
        }
        None => 0.0,
    }
}

/// Labor dollars before materials, with the service-type floor applied.
pub fn moving_labor(request: &MoveQuoteRequest, config: &PricingConfig) -> f64 {
    let computed = if request.manual_labor_hours > 0.0 {
        request.crew_size as f64 * request.manual_labor_hours * config.mover_hourly_rate
    } else {
        let mut labor = location_labor(&request.pickup, request.service_type, config);
        let mut surcharge = config.parking_surcharge(request.pickup.parking_distance)
            + config.parking_surcharge(request.delivery.parking_distance);
        if let Some(stop) = &request.additional_stop {
            labor += location_labor(stop, request.service_type, config);
            surcharge += config.parking_surcharge(stop.parking_distance);
        }
        labor * (1.0 + surcharge)
    };

    let minimum = config.labor_minimum(request.service_type);
    if computed < minimum {
        debug!("Labor {:.2} below {:.2} minimum, using minimum", computed, minimum);
        minimum
    } else {
        computed
    }
}

fn moving_item(labor: f64, config: &PricingConfig) -> QuoteLineItem {
    let labor = round_cents(labor);
    QuoteLineItem::with_sub_items(
        MOVING,
        vec![
            QuoteLineItem::new(LABOR, labor),
            QuoteLineItem::new(MATERIALS, labor * config.materials_rate),
        ],
    )
}

fn replace_item(items: &mut [QuoteLineItem], replacement: QuoteLineItem) {
    if let Some(item) = items.iter_mut().find(|i| i.description == replacement.description) {
        *item = replacement;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    ToPickup,
    PickupToDelivery,
    Return,
}

impl LegKind {
    pub fn label(self) -> &'static str {
        match self {
            LegKind::ToPickup => "To Pickup",
            LegKind::PickupToDelivery => "Pickup to Delivery",
            LegKind::Return => "Return",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegCharge {
    pub kind: LegKind,
    pub miles: f64,
    pub free_miles: f64,
    pub billable_miles: f64,
    pub minutes: f64,
    pub mileage_charge: f64,
    pub time_charge: f64,
}

impl LegCharge {
    pub fn total(&self) -> f64 {
        self.mileage_charge + self.time_charge
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TravelCharges {
    pub legs: Vec<LegCharge>,
    /// Drive-time charge of the pickup-to-delivery leg, counted toward the
    /// combined minimum.
    pub move_leg_time_charge: f64,
}

impl TravelCharges {
    pub fn total(&self) -> f64 {
        self.legs.iter().map(LegCharge::total).sum()
    }

    fn line_item(&self, config: &PricingConfig) -> QuoteLineItem {
        let total = self.total();
        if total < config.travel_minimum {
            return QuoteLineItem::new(TRAVEL, config.travel_minimum);
        }
        let legs = self
            .legs
            .iter()
            .map(|leg| {
                QuoteLineItem::new(
                    format!("{} ({:.1} mi, {:.0} min)", leg.kind.label(), leg.miles, leg.minutes),
                    leg.total(),
                )
            })
            .collect();
        QuoteLineItem::with_sub_items(TRAVEL, legs)
    }
}

/// Bills the three route legs. Free miles are used up in leg order, so the
/// first leg absorbs them before the second sees any.
pub fn travel_charges(
    distance: &DistanceData,
    service: ServiceType,
    waive_travel: bool,
    config: &PricingConfig,
) -> TravelCharges {
    let legs: [(LegKind, DistanceLeg, bool); 3] = [
        (LegKind::ToPickup, distance.to_pickup, !waive_travel),
        (LegKind::PickupToDelivery, distance.pickup_to_delivery, true),
        (LegKind::Return, distance.delivery_to_return, !waive_travel),
    ];

    let mut free_remaining = config.free_miles.max(0.0);
    let mut charges = Vec::new();
    let mut move_leg_time_charge = 0.0;

    for (kind, leg, charged) in legs {
        if !charged {
            continue;
        }
        let free = free_remaining.min(leg.miles);
        free_remaining -= free;
        let billable_miles = leg.miles - free;
        let time_charge = leg.minutes / 60.0 * config.travel_hourly_rate;
        if kind == LegKind::PickupToDelivery {
            move_leg_time_charge = time_charge;
        }
        charges.push(LegCharge {
            kind,
            miles: leg.miles,
            free_miles: free,
            billable_miles,
            minutes: leg.minutes,
            mileage_charge: billable_miles * config.mile_rate(service),
            time_charge,
        });
    }

    TravelCharges {
        legs: charges,
        move_leg_time_charge,
    }
}

fn stairs_item(request: &MoveQuoteRequest, config: &PricingConfig) -> Option<QuoteLineItem> {
    let mut stops = vec![("Pickup", &request.pickup), ("Delivery", &request.delivery)];
    if let Some(stop) = &request.additional_stop {
        stops.push(("Additional Stop", stop));
    }

    let sub_items: Vec<QuoteLineItem> = stops
        .into_iter()
        .filter(|(_, loc)| loc.stairs > 1 && !loc.has_elevator)
        .map(|(label, loc)| {
            QuoteLineItem::new(
                format!("{} ({} levels)", label, loc.stairs),
                (loc.stairs - 1) as f64 * config.stairs_per_level,
            )
        })
        .collect();

    if sub_items.is_empty() {
        None
    } else {
        Some(QuoteLineItem::with_sub_items(STAIRS, sub_items))
    }
}

fn special_item_charges(items: &SpecialItems) -> Vec<QuoteLineItem> {
    const GROUND_LEVEL: &str = "Must be on ground level";
    let mut charges = Vec::new();

    if items.piano {
        charges.push(QuoteLineItem::new("Piano", 200.0));
    }
    if items.grand_piano {
        charges.push(QuoteLineItem::new("Grand Piano", 400.0).alert(GROUND_LEVEL));
    }
    if items.pool_table {
        charges.push(
            QuoteLineItem::new("Pool Table", 300.0).alert("Disassembly required before the move"),
        );
    }
    if items.gun_safes > 0 {
        charges.push(
            QuoteLineItem::new(format!("Gun Safe (x{})", items.gun_safes), items.gun_safes as f64 * 250.0)
                .alert(GROUND_LEVEL),
        );
    }
    if items.tvs > 0 {
        charges.push(QuoteLineItem::new(format!("TV (x{})", items.tvs), items.tvs as f64 * 40.0));
    }
    if items.appliances > 0 {
        charges.push(QuoteLineItem::new(
            format!("Appliance (x{})", items.appliances),
            items.appliances as f64 * 50.0,
        ));
    }
    if items.exercise_equipment > 0 {
        charges.push(QuoteLineItem::new(
            format!("Exercise Equipment (x{})", items.exercise_equipment),
            items.exercise_equipment as f64 * 75.0,
        ));
    }
    if items.hot_tub {
        charges.push(
            QuoteLineItem::new("Hot Tub", 500.0).alert("Must be drained and disconnected before the move"),
        );
    }

    charges
}

fn junk_removal_item(request: &MoveQuoteRequest, config: &PricingConfig) -> Option<QuoteLineItem> {
    let base = match request.junk_removal {
        JunkRemovalAmount::None => return None,
        JunkRemovalAmount::Small => config.junk_small,
        JunkRemovalAmount::Medium => config.junk_medium,
        JunkRemovalAmount::Large => config.junk_large,
        JunkRemovalAmount::FullLoad => config.junk_full_load,
    };
    let description = format!("Junk Removal ({})", request.junk_removal.label());

    if request.includes_move() {
        let pct = (config.junk_bundle_discount * 100.0).round();
        Some(
            QuoteLineItem::new(description, base * (1.0 - config.junk_bundle_discount))
                .discount(format!("{}% off with move", pct)),
        )
    } else {
        Some(QuoteLineItem::new(description, base))
    }
}

fn packing_item(request: &MoveQuoteRequest, config: &PricingConfig) -> Option<QuoteLineItem> {
    let sqft = request.pickup.square_feet();
    let labor = match request.packing {
        PackingLevel::None => return None,
        PackingLevel::AFew => config.packing_a_few,
        PackingLevel::Moderate => sqft * config.packing_moderate_sqft_rate,
        PackingLevel::QuiteABit => sqft * config.packing_quite_a_bit_sqft_rate,
        PackingLevel::Lots => sqft * config.packing_lots_sqft_rate,
    };
    if labor <= 0.0 {
        return None;
    }
    let labor = round_cents(labor);
    Some(QuoteLineItem::with_sub_items(
        PACKING,
        vec![
            QuoteLineItem::new(PACKING_LABOR, labor),
            QuoteLineItem::new(PACKING_MATERIALS, labor * config.packing_materials_rate),
        ],
    ))
}

/// Re-prices labor so the quote lands on the customer's budget. Never goes
/// below a minimum crew; in that case the estimate is left as is and the
/// quote is flagged.
fn apply_fixed_budget(
    request: &MoveQuoteRequest,
    items: &mut [QuoteLineItem],
    labor: f64,
    config: &PricingConfig,
) -> BudgetCheck {
    if !request.fixed_budget || request.fixed_budget_amount <= 0.0 {
        return BudgetCheck::default();
    }

    let other_costs: f64 = items
        .iter()
        .filter(|i| i.description != MOVING)
        .map(|i| i.amount)
        .sum();
    let minimum_labor = config.budget_minimum_labor();
    let minimum_budget = round_cents(other_costs + minimum_labor * (1.0 + config.materials_rate));

    let available = request.fixed_budget_amount - other_costs;
    let budget_labor = available / (1.0 + config.materials_rate);

    if budget_labor < minimum_labor {
        warn!(
            "Fixed budget {:.2} leaves {:.2} for labor, below the {:.2} minimum",
            request.fixed_budget_amount, budget_labor, minimum_labor
        );
        return BudgetCheck {
            requested: true,
            insufficient: true,
            minimum_budget: Some(minimum_budget),
        };
    }

    if budget_labor < labor {
        info!("Fitting labor to fixed budget: {:.2} -> {:.2}", labor, budget_labor);
        replace_item(items, moving_item(budget_labor, config));
    }

    BudgetCheck {
        requested: true,
        insufficient: false,
        minimum_budget: Some(minimum_budget),
    }
}

pub fn calculate_quote(
    request: &MoveQuoteRequest,
    distance: Option<&DistanceData>,
    config: &PricingConfig,
) -> Quote {
    let mut labor = moving_labor(request, config);
    let mut items = vec![moving_item(labor, config)];

    let travel = distance
        .map(|d| travel_charges(d, request.service_type, request.waive_travel, config));
    if let Some(travel) = &travel {
        items.push(travel.line_item(config));
    }

    items.extend(stairs_item(request, config));
    items.extend(special_item_charges(&request.special_items));
    items.extend(junk_removal_item(request, config));

    // Short local truck jobs still have to cover the crew's minimum
    if let (ServiceType::Truck, Some(travel)) = (request.service_type, &travel) {
        let floor = config.combined_minimum - travel.move_leg_time_charge;
        if labor < floor {
            debug!("Raising labor {:.2} to combined minimum floor {:.2}", labor, floor);
            labor = floor;
            replace_item(&mut items, moving_item(labor, config));
        }
    }

    items.extend(packing_item(request, config));

    let budget = apply_fixed_budget(request, &mut items, labor, config);
    let total = round_cents(items.iter().map(|i| i.amount).sum());

    Quote { items, total, budget }
}
