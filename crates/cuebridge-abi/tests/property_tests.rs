//! Property-based tests for LED id encoding and fixed strings.

use cuebridge_abi::{CorsairDeviceId, LedGroup, LedLuid, fixed_c_string, to_fixed_c_string};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_luid_packs_group_and_index(group in any::<u16>(), index in any::<u16>()) {
        let luid = LedLuid::new(LedGroup(group), index);

        prop_assert_eq!(luid.group(), LedGroup(group));
        prop_assert_eq!(luid.index(), index);
        prop_assert_eq!(luid.raw() >> 16, u32::from(group));
    }

    #[test]
    fn prop_raw_luid_splits_losslessly(raw in any::<u32>()) {
        let luid = LedLuid::from(raw);
        prop_assert_eq!(LedLuid::new(luid.group(), luid.index()), luid);
    }

    #[test]
    fn prop_short_ascii_ids_survive_fixed_buffer(id in "[ -~]{0,127}") {
        let fixed: Option<CorsairDeviceId> = to_fixed_c_string(&id);
        prop_assert!(fixed.is_some());
        if let Some(fixed) = fixed {
            prop_assert_eq!(fixed_c_string(&fixed), id);
        }
    }
}
