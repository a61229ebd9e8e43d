//! Canonical field names for shipment tracking extracts.
//!
//! The rename table is static; only the key field's raw header varies by
//! deployment, so it is resolved into the map once per run.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Canonical name the key field is always renamed to, whatever its raw
/// header is called.
pub const CANONICAL_KEY: &str = "job_number";

/// Raw header the key field carries in most deployments.
pub const DEFAULT_KEY_HEADER: &str = "Job No.";

/// Columns whose normalized values are mapped onto booleans where the
/// yes/no vocabulary matches.
pub const FLAG_COLUMNS: &[&str] = &[
    "hot_container_flag",
    "late_booking_status",
    "current_departure_status",
    "current_arrival_status",
    "late_arrival_status",
    "late_container_return_status",
];

/// Raw source header -> canonical field name, as produced by the upstream
/// tracking system's export. Headers not listed here pass through renaming
/// untouched.
static CANONICAL_HEADERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("carr_eqp_uid", "carr_eqp_uid"),
        ("Container Number", "container_number"),
        ("Container Type", "container_type"),
        ("Destination Service", "destination_service"),
        ("Consignee Code (Multiple)", "consignee_code_multiple"),
        ("PO Number (Multiple)", "po_number_multiple"),
        ("Booking Number (Multiple)", "booking_number_multiple"),
        ("FCR Number (Multiple)", "fcr_number_multiple"),
        ("Ocean BL No (Multiple)", "ocean_bl_no_multiple"),
        ("Load Port", "load_port"),
        ("Final Load Port", "final_load_port"),
        ("Discharge Port", "discharge_port"),
        ("Last CY Location", "last_cy_location"),
        ("Place of Receipt", "place_of_receipt"),
        ("Place of Delivery", "place_of_delivery"),
        ("Final Destination", "final_destination"),
        ("First Vessel Code", "first_vessel_code"),
        ("First Vessel Name", "first_vessel_name"),
        ("First Voyage code", "first_voyage_code"),
        ("Final Carrier Code", "final_carrier_code"),
        ("Final Carrier SCAC Code", "final_carrier_scac_code"),
        ("Final Carrier Name", "final_carrier_name"),
        ("Final Vessel Code", "final_vessel_code"),
        ("Final Vessel Name", "final_vessel_name"),
        ("Final Voyage code", "final_voyage_code"),
        ("True Carrier Code", "true_carrier_code"),
        ("True Carrier SCAC Code", "true_carrier_scac_code"),
        ("True Carrier SCAC Name", "true_carrier_scac_name"),
        ("ETD LP", "etd_lp"),
        ("ETD FLP", "etd_flp"),
        ("ETA DP", "eta_dp"),
        ("ETA FD", "eta_fd"),
        ("Revised ETA", "revised_eta"),
        ("Predictive ETA", "predictive_eta"),
        ("ATD LP", "atd_lp"),
        ("ATA FLP", "ata_flp"),
        ("ATD FLP", "atd_flp"),
        ("ATA DP", "ata_dp"),
        ("Derived ATA DP", "derived_ata_dp"),
        ("Revised ETA FD", "revised_eta_fd"),
        ("Predictive ETA FD", "predictive_eta_fd"),
        ("Cargo Received Date (Multiple)", "cargo_received_date_multiple"),
        ("Detention Free Days", "detention_free_days"),
        ("Demurrage Free Days", "demurrage_free_days"),
        ("Hot Container Flag", "hot_container_flag"),
        ("Supplier/Vendor Name", "supplier_vendor_name"),
        ("Manufacturer Name", "manufacturer_name"),
        ("Ship To Party Name", "ship_to_party_name"),
        ("Booking Approval Status", "booking_approval_status"),
        ("Service Contract Number", "service_contract_number"),
        ("CARRIER VEHICLE LOAD Date", "carrier_vehicle_load_date"),
        ("Carrier Vehicle Load Lcn", "carrier_vehicle_load_lcn"),
        ("Vehicle Departure Date", "vehicle_departure_date"),
        ("Vehicle Departure Lcn", "vehicle_departure_lcn"),
        ("Vehicle Arrival Date", "vehicle_arrival_date"),
        ("Vehicle Arrival Lcn", "vehicle_arrival_lcn"),
        ("Carrier Vehicle Unload Date", "carrier_vehicle_unload_date"),
        ("Carrier Vehicle Unload Lcn", "carrier_vehicle_unload_lcn"),
        ("Out Gate Date From DP", "out_gate_date_from_dp"),
        ("Out Gate Location", "out_gate_location"),
        ("Equipment Arrived at Last CY", "equipment_arrived_at_last_cy"),
        ("Equipment Arrival at Last Lcn", "equipment_arrival_at_last_lcn"),
        ("Out gate at Last CY", "out_gate_at_last_cy"),
        ("Out gate at Last CY Lcn", "out_gate_at_last_cy_lcn"),
        ("Delivery Date To Consignee", "delivery_date_to_consignee"),
        ("Delivery Date To Consignee Lcn", "delivery_date_to_consignee_lcn"),
        ("Empty Container Return Date", "empty_container_return_date"),
        ("Empty Container Return Lcn", "empty_container_return_lcn"),
        ("Late Booking Status", "late_booking_status"),
        ("Current Departure status", "current_departure_status"),
        ("Current Arrival status", "current_arrival_status"),
        ("Late Arrival status", "late_arrival_status"),
        ("Late Container Return status", "late_container_return_status"),
        ("CO2 Emission For Tank On Wheel", "co2_emission_for_tank_on_wheel"),
        ("CO2 Emission For Well To Wheel", "co2_emission_for_well_to_wheel"),
        ("Job Type", "job_type"),
        ("MCS HBL", "mcs_hbl"),
        ("Transport Mode", "transport_mode"),
    ])
});

/// The rename table for one run: the static canonical map plus the
/// deployment's key header resolved to [`CANONICAL_KEY`].
#[derive(Debug, Clone)]
pub struct ColumnMap {
    entries: HashMap<String, String>,
}

impl ColumnMap {
    pub fn for_key(raw_key_header: &str) -> Self {
        let mut entries: HashMap<String, String> = CANONICAL_HEADERS
            .iter()
            .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
            .collect();
        entries.insert(raw_key_header.to_string(), CANONICAL_KEY.to_string());
        Self { entries }
    }

    pub fn resolve(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::for_key(DEFAULT_KEY_HEADER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_header_resolves_to_canonical_key() {
        let map = ColumnMap::for_key("Job Reference");
        assert_eq!(map.resolve("Job Reference"), Some(CANONICAL_KEY));
        assert_eq!(map.resolve("Container Number"), Some("container_number"));
        assert_eq!(map.resolve("Not A Known Header"), None);
    }

    #[test]
    fn default_map_uses_default_key_header() {
        let map = ColumnMap::default();
        assert_eq!(map.resolve(DEFAULT_KEY_HEADER), Some(CANONICAL_KEY));
    }

    #[test]
    fn flag_columns_are_canonical_names() {
        for flag in FLAG_COLUMNS {
            assert!(
                CANONICAL_HEADERS.values().any(|canonical| canonical == flag),
                "flag column {flag} is not a canonical schema target"
            );
        }
    }
}
