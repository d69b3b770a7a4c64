//! Static field tables for the binary and trace headers
//!
//! Single source of truth for field names, 1-based byte offsets, and
//! widths, shared by the codec, the editors, the plan validator, and
//! the expression environment. All standard fields are signed
//! big-endian integers of 2 or 4 bytes.

/// One named header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Canonical snake_case name.
    pub name: &'static str,
    /// 1-based byte offset within the header block, per SEG-Y convention.
    pub offset: u16,
    /// Width in bytes (2 or 4).
    pub width: u8,
    /// Whether the value is interpreted as signed.
    pub signed: bool,
}

impl FieldDef {
    /// Inclusive range of values that fit this field.
    pub fn value_range(&self) -> (i64, i64) {
        crate::header::span_range(self.width, self.signed)
    }
}

const fn f(name: &'static str, offset: u16, width: u8) -> FieldDef {
    FieldDef { name, offset, width, signed: true }
}

/// The 400-byte binary file header, SEG-Y revision 1.
///
/// Bytes 61..=300 are unassigned by the standard and are not named;
/// they remain reachable through custom byte-offset edits.
pub static BINARY_FIELDS: &[FieldDef] = &[
    f("job_id", 1, 4),
    f("line_number", 5, 4),
    f("reel_number", 9, 4),
    f("traces_per_ensemble", 13, 2),
    f("aux_traces_per_ensemble", 15, 2),
    f("sample_interval", 17, 2),
    f("sample_interval_original", 19, 2),
    f("samples_per_trace", 21, 2),
    f("samples_per_trace_original", 23, 2),
    f("format_code", 25, 2),
    f("ensemble_fold", 27, 2),
    f("trace_sorting_code", 29, 2),
    f("vertical_sum_code", 31, 2),
    f("sweep_frequency_start", 33, 2),
    f("sweep_frequency_end", 35, 2),
    f("sweep_length", 37, 2),
    f("sweep_type_code", 39, 2),
    f("sweep_channel", 41, 2),
    f("sweep_taper_start", 43, 2),
    f("sweep_taper_end", 45, 2),
    f("taper_type", 47, 2),
    f("correlated_traces", 49, 2),
    f("binary_gain_recovered", 51, 2),
    f("amplitude_recovery_method", 53, 2),
    f("measurement_system", 55, 2),
    f("impulse_signal_polarity", 57, 2),
    f("vibratory_polarity_code", 59, 2),
    f("segy_revision", 301, 2),
    f("fixed_length_trace_flag", 303, 2),
    f("extended_textual_headers", 305, 2),
];

/// The standard 240-byte trace header, SEG-Y revision 1.
pub static TRACE_FIELDS: &[FieldDef] = &[
    f("trace_sequence_line", 1, 4),
    f("trace_sequence_file", 5, 4),
    f("field_record", 9, 4),
    f("trace_number_field", 13, 4),
    f("energy_source_point", 17, 4),
    f("ensemble_number", 21, 4),
    f("trace_in_ensemble", 25, 4),
    f("trace_id_code", 29, 2),
    f("summed_traces", 31, 2),
    f("stacked_traces", 33, 2),
    f("data_use", 35, 2),
    f("offset", 37, 4),
    f("receiver_elevation", 41, 4),
    f("source_surface_elevation", 45, 4),
    f("source_depth", 49, 4),
    f("receiver_datum_elevation", 53, 4),
    f("source_datum_elevation", 57, 4),
    f("source_water_depth", 61, 4),
    f("receiver_water_depth", 65, 4),
    f("elevation_scalar", 69, 2),
    f("coordinate_scalar", 71, 2),
    f("source_x", 73, 4),
    f("source_y", 77, 4),
    f("group_x", 81, 4),
    f("group_y", 85, 4),
    f("coordinate_units", 89, 2),
    f("weathering_velocity", 91, 2),
    f("subweathering_velocity", 93, 2),
    f("source_uphole_time", 95, 2),
    f("receiver_uphole_time", 97, 2),
    f("source_static", 99, 2),
    f("receiver_static", 101, 2),
    f("total_static", 103, 2),
    f("lag_time_a", 105, 2),
    f("lag_time_b", 107, 2),
    f("delay_recording_time", 109, 2),
    f("mute_time_start", 111, 2),
    f("mute_time_end", 113, 2),
    f("samples", 115, 2),
    f("sample_interval", 117, 2),
    f("gain_type", 119, 2),
    f("instrument_gain", 121, 2),
    f("instrument_initial_gain", 123, 2),
    f("correlated", 125, 2),
    f("sweep_frequency_start", 127, 2),
    f("sweep_frequency_end", 129, 2),
    f("sweep_length", 131, 2),
    f("sweep_type", 133, 2),
    f("sweep_taper_start", 135, 2),
    f("sweep_taper_end", 137, 2),
    f("taper_type", 139, 2),
    f("alias_filter_frequency", 141, 2),
    f("alias_filter_slope", 143, 2),
    f("notch_filter_frequency", 145, 2),
    f("notch_filter_slope", 147, 2),
    f("low_cut_frequency", 149, 2),
    f("high_cut_frequency", 151, 2),
    f("low_cut_slope", 153, 2),
    f("high_cut_slope", 155, 2),
    f("year", 157, 2),
    f("day_of_year", 159, 2),
    f("hour", 161, 2),
    f("minute", 163, 2),
    f("second", 165, 2),
    f("time_basis_code", 167, 2),
    f("trace_weighting_factor", 169, 2),
    f("geophone_group_roll", 171, 2),
    f("geophone_group_first_trace", 173, 2),
    f("geophone_group_last_trace", 175, 2),
    f("gap_size", 177, 2),
    f("over_travel", 179, 2),
    f("cdp_x", 181, 4),
    f("cdp_y", 185, 4),
    f("inline", 189, 4),
    f("crossline", 193, 4),
    f("shotpoint", 197, 4),
    f("shotpoint_scalar", 201, 2),
    f("trace_value_unit", 203, 2),
    f("transduction_mantissa", 205, 4),
    f("transduction_exponent", 209, 2),
    f("transduction_unit", 211, 2),
    f("device_id", 213, 2),
    f("time_scalar", 215, 2),
    f("source_type", 217, 2),
    f("source_energy_direction_vertical", 219, 2),
    f("source_energy_direction_crossline", 221, 2),
    f("source_energy_direction_inline", 223, 2),
    f("source_measurement_mantissa", 225, 4),
    f("source_measurement_exponent", 229, 2),
    f("source_measurement_unit", 231, 2),
    f("unassigned_1", 233, 4),
    f("unassigned_2", 237, 4),
];

/// Look up a binary-header field by canonical name.
pub fn binary_field(name: &str) -> Option<&'static FieldDef> {
    BINARY_FIELDS.iter().find(|d| d.name == name)
}

/// Look up a trace-header field by canonical name.
pub fn trace_field(name: &str) -> Option<&'static FieldDef> {
    TRACE_FIELDS.iter().find(|d| d.name == name)
}

/// Look up a trace-header field by its 1-based byte offset.
pub fn trace_field_at(offset: u16) -> Option<&'static FieldDef> {
    TRACE_FIELDS.iter().find(|d| d.offset == offset)
}

/// Look up a binary-header field by its 1-based byte offset.
pub fn binary_field_at(offset: u16) -> Option<&'static FieldDef> {
    BINARY_FIELDS.iter().find(|d| d.offset == offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_fields_tile_all_240_bytes() {
        let mut next = 1u16;
        for def in TRACE_FIELDS {
            assert_eq!(def.offset, next, "gap before field '{}'", def.name);
            next += def.width as u16;
        }
        assert_eq!(next, 241);
    }

    #[test]
    fn binary_fields_lie_inside_400_bytes() {
        let mut prev_end = 0u16;
        for def in BINARY_FIELDS {
            assert!(def.offset > prev_end, "field '{}' overlaps", def.name);
            let end = def.offset + def.width as u16 - 1;
            assert!(end <= 400, "field '{}' past byte 400", def.name);
            prev_end = end;
        }
    }

    #[test]
    fn canonical_offsets() {
        assert_eq!(binary_field("sample_interval").unwrap().offset, 17);
        assert_eq!(binary_field("format_code").unwrap().offset, 25);
        assert_eq!(binary_field("extended_textual_headers").unwrap().offset, 305);
        assert_eq!(trace_field("coordinate_scalar").unwrap().offset, 71);
        assert_eq!(trace_field("source_x").unwrap().offset, 73);
        assert_eq!(trace_field("cdp_y").unwrap().offset, 185);
        assert_eq!(trace_field("crossline").unwrap().offset, 193);
        assert!(trace_field("no_such_field").is_none());
    }

    #[test]
    fn lookup_by_offset() {
        assert_eq!(trace_field_at(73).unwrap().name, "source_x");
        assert_eq!(binary_field_at(17).unwrap().name, "sample_interval");
        assert!(trace_field_at(74).is_none());
    }

    #[test]
    fn value_ranges_follow_width() {
        let si = binary_field("sample_interval").unwrap();
        assert_eq!(si.value_range(), (i16::MIN as i64, i16::MAX as i64));
        let sx = trace_field("source_x").unwrap();
        assert_eq!(sx.value_range(), (i32::MIN as i64, i32::MAX as i64));
    }
}
