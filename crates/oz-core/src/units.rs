// oz-core/src/units.rs

use uom::si::f64::{
    Length as UomLength, Mass as UomMass, MassDensity as UomMassDensity, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Density = UomMassDensity;
pub type Volume = UomVolume;

#[inline]
pub fn g(v: f64) -> Mass {
    use uom::si::mass::gram;
    Mass::new::<gram>(v)
}

#[inline]
pub fn ul(v: f64) -> Volume {
    use uom::si::volume::microliter;
    Volume::new::<microliter>(v)
}

#[inline]
pub fn g_per_ml(v: f64) -> Density {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    Density::new::<gram_per_cubic_centimeter>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

/// Mass in grams.
#[inline]
pub fn in_g(m: Mass) -> f64 {
    use uom::si::mass::gram;
    m.get::<gram>()
}

/// Volume in microliters.
#[inline]
pub fn in_ul(v: Volume) -> f64 {
    use uom::si::volume::microliter;
    v.get::<microliter>()
}

/// Density in g/mL.
#[inline]
pub fn in_g_per_ml(d: Density) -> f64 {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    d.get::<gram_per_cubic_centimeter>()
}

/// Volume occupied by `mass` at `density`.
#[inline]
pub fn volume_of(mass: Mass, density: Density) -> Volume {
    // 1 g / (1 g/mL) = 1 mL = 1000 uL
    ul(in_g(mass) / in_g_per_ml(density) * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _m = g(10.0);
        let _v = ul(30.0);
        let _rho = g_per_ml(0.789);
        let _h = mm(0.5);
    }

    #[test]
    fn unit_round_trip() {
        assert!((in_g(g(2.5)) - 2.5).abs() < 1e-12);
        assert!((in_ul(ul(7.5)) - 7.5).abs() < 1e-12);
        assert!((in_g_per_ml(g_per_ml(0.997)) - 0.997).abs() < 1e-12);
    }

    #[test]
    fn water_gram_is_a_milliliter() {
        let v = volume_of(g(1.0), g_per_ml(1.0));
        assert!((in_ul(v) - 1000.0).abs() < 1e-9);
    }
}
