//! Shared fixtures for integration tests.

/// One tip cycle with a combined transfer line and its folded details.
#[allow(dead_code)]
pub const SINGLE_TRANSFER_LOG: &str = "Picking up tip from A1 of Rack on 6
Transferring 21.5 from A1 of Reservoir on 1 to A1 of Plate on 3
        Aspirating 21.5 uL from A1 of Reservoir on 1 at 92.86 uL/sec
        Dispensing 21.5 uL into A1 of Plate on 3 at 92.86 uL/sec
Dropping tip into A1 of Trash on 12
";

/// Temperature, magnetic and heater-shaker sections in one run.
#[allow(dead_code)]
pub const MODULE_RUN_LOG: &str = "
 ------------- TRANSFERRING WATER ------------
Setting Temperature Module temperature to 4.0 °C (rounded off to nearest integer)

Picking up tip from A1 of Opentrons OT-2 96 Filter Tip Rack 200 µL on 6
Transferring 21.5 from A1 of Agilent 1 Well Reservoir 290 mL on 1 to A1 of Bio-Rad 96 Well Plate 200 µL PCR on 3
        Aspirating 21.5 uL from A1 of Agilent 1 Well Reservoir 290 mL on 1 at 92.86 uL/sec
        Dispensing 21.5 uL into A1 of Bio-Rad 96 Well Plate 200 µL PCR on 3 at 92.86 uL/sec
Dropping tip into A1 of Opentrons Fixed Trash on 12
Deactivating Temperature Module


 ------------- TRANSFERRING DNA ------------

Engaging Magnetic Module
Picking up tip from B1 of Opentrons OT-2 96 Filter Tip Rack 200 µL on 6
Transferring 10.5 from A1 of Bio-Rad 96 Well Plate 200 µL PCR on 2 to A1 of Bio-Rad 96 Well Plate 200 µL PCR on 3
        Aspirating 10.5 uL from A1 of Bio-Rad 96 Well Plate 200 µL PCR on 2 at 92.86 uL/sec
        Dispensing 10.5 uL into A1 of Bio-Rad 96 Well Plate 200 µL PCR on 3 at 92.86 uL/sec
Dropping tip into A1 of Opentrons Fixed Trash on 12

Delaying for 5 minutes and 0.0 seconds
Disengaging Magnetic Module

 ------------- Operating the heater shaker------------

Setting Target Temperature of Heater-Shaker to 37 °C
Waiting for Heater-Shaker to reach target temperature
Setting Heater-Shaker to Shake at 200 RPM and waiting until reached
Delaying for 60 minutes and 0.0 seconds
Deactivating Heater

Protocol complete
";

/// Labware descriptor matching `MODULE_RUN_LOG`.
#[allow(dead_code)]
pub const MODULE_RUN_LABWARE: &str = r#"{
  "labware": [
    { "name": "water_reservoir", "slot": "1", "type": "agilent_1_reservoir_290ml" },
    { "name": "dna_plate", "slot": "2", "type": "biorad_96_wellplate_200ul_pcr" },
    { "name": "pcr_plate", "slot": "3", "type": "biorad_96_wellplate_200ul_pcr" },
    { "name": "tips", "slot": "6", "type": "opentrons_96_filtertiprack_200ul" },
    { "name": "shaker", "slot": 10, "type": "heaterShakerModuleV1" }
  ]
}"#;

/// Eight single-channel cycles from slot 1 to slot 2, one per row.
#[allow(dead_code)]
pub fn column_transfer_log() -> String {
    let mut out = String::new();
    for (i, row) in ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'].iter().enumerate() {
        out.push_str(&format!(
            "Picking up tip from {row}{col} of Tips on 6\n\
             Aspirating 30.0 uL from {row}1 of Source on 1 at 46.43 uL/sec\n\
             Dispensing 30.0 uL into {row}1 of Dest on 2 at 46.43 uL/sec\n\
             Dropping tip into A1 of Trash on 12\n",
            row = row,
            col = i + 1,
        ));
    }
    out
}
