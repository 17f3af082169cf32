/// First bit index available to derived subsystems. Bits below this belong
/// to the base gate set.
pub const EXTENSION_BASE: u32 = 16;

bitflags::bitflags! {
    /// Gate outcomes of an interaction attempt.
    ///
    /// Two masks travel together: `checked` records every gate that ran and
    /// `failed` the subset that rejected the attempt, so `failed ⊆ checked`
    /// always holds. Gate failures are data, not errors; callers branch on
    /// `failed.is_empty()`.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct InteractionStatus: u32 {
        const RCVR_RANGE_LIMITS = 1 << 0;
        const RCVR_ALTITUDE_LIMITS = 1 << 1;
        const RCVR_ANGLE_LIMITS = 1 << 2;
        const XMTR_RANGE_LIMITS = 1 << 3;
        const XMTR_ALTITUDE_LIMITS = 1 << 4;
        const XMTR_ANGLE_LIMITS = 1 << 5;
        const RCVR_HORIZON_MASKING = 1 << 6;
        const XMTR_HORIZON_MASKING = 1 << 7;
        const MASKING_FACTOR = 1 << 8;
        const SIGNAL_LEVEL = 1 << 9;
        const RCVR_TERRAIN_MASKING = 1 << 10;
        const XMTR_TERRAIN_MASKING = 1 << 11;

        // Bits at and above EXTENSION_BASE are owned by derived subsystems.
        const _ = !0;
    }
}

impl InteractionStatus {
    /// An extension bit owned by a derived subsystem.
    ///
    /// # Panics
    /// When `index` reaches into the base gate bits.
    #[must_use]
    pub fn extension(index: u32) -> Self {
        assert!(
            index + EXTENSION_BASE < u32::BITS,
            "extension bit {index} out of range"
        );
        Self::from_bits_retain(1 << (EXTENSION_BASE + index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_bits_clear_the_base_set() {
        let ext = InteractionStatus::extension(0);
        assert_eq!(ext.bits(), 1 << 16);
        assert!(ext.intersection(InteractionStatus::XMTR_TERRAIN_MASKING).is_empty());
        let high = InteractionStatus::extension(15);
        assert_eq!(high.bits(), 1 << 31);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn extension_bit_past_the_word_panics() {
        let _ = InteractionStatus::extension(16);
    }
}
