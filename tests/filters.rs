use dyneumo_filter::{
    check_memory, AbsParameter, BiquadParameter, Cascade, Error,
    ExponentialMovingAverageParameter, Filter, FilterFunction,
    FilterParameter, OffsetParameter, PassParameter, Sample,
};
use signal_probe::{Config, Signal};

/// White noise with a DC offset.
fn noise(amplitude: Sample, offset: Sample, length: u32) -> Vec<Sample> {
    Config {
        signal: Signal::WhiteNoise,
        amplitude,
        length,
        seed: 0x1234,
        ..Default::default()
    }
    .build(1.0)
    .unwrap()
    .map(|x| x + offset)
    .collect()
}

fn mean(x: &[Sample]) -> f64 {
    x.iter().map(|&x| x as f64).sum::<f64>() / x.len() as f64
}

fn variance(x: &[Sample]) -> f64 {
    let m = mean(x);
    x.iter().map(|&x| (x as f64 - m).powi(2)).sum::<f64>() / x.len() as f64
}

/// Lowpass biquad, Q1.14: fc = 0.05 fs, Q = 1/sqrt(2).
const LOWPASS: BiquadParameter =
    BiquadParameter::new([329, 658, 329], [-25575, 10508], 14);

fn chain() -> [FilterParameter; 5] {
    [
        OffsetParameter { shift: 6 }.into(),
        LOWPASS.into(),
        LOWPASS.into(),
        AbsParameter.into(),
        ExponentialMovingAverageParameter { shift: 4 }.into(),
    ]
}

#[test]
fn deterministic() {
    let x = noise(8000, 0, 1 << 14);
    let run = || {
        let mut c = Cascade::build(&chain()).unwrap();
        x.iter().map(|&x| c.next(x)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn block_matches_samples() {
    let x = noise(8000, 0, 4096);
    let mut a = Cascade::build(&chain()).unwrap();
    let mut b = a.clone();
    let y: Vec<_> = x.iter().map(|&x| a.next(x)).collect();
    let mut z = x.clone();
    for block in z.chunks_mut(100) {
        b.process(block);
    }
    assert_eq!(y, z);
}

#[test]
fn offset_removes_dc() {
    let x = noise(1000, 3000, 1 << 16);
    let mut f = OffsetParameter { shift: 5 }.build().unwrap();
    let y: Vec<_> = x.iter().map(|&x| f.next(x)).collect();
    let tail = &y[y.len() / 2..];
    assert!(mean(tail).abs() < 50.0, "{}", mean(tail));
    assert!((mean(&x) - 3000.0).abs() < 50.0);
    assert!((f.dc() as f64 - 3000.0).abs() < 300.0, "{}", f.dc());
}

fn median(x: &[Sample]) -> Sample {
    let mut x = x.to_vec();
    x.sort_unstable();
    x[x.len() / 2]
}

#[test]
fn offset_ramp_median_shrinks() {
    let mut f = OffsetParameter { shift: 4 }.build().unwrap();
    let y: Vec<_> = (0..4096).map(|n| f.next(2000 + n / 64)).collect();
    let m: Vec<_> =
        [32, 512, 4096].iter().map(|&n| median(&y[..n])).collect();
    assert!(m[0] > m[1], "{m:?}");
    assert!((0..=16).contains(&m[2]), "{m:?}");
    assert!(y[4000..].iter().all(|y| (0..=16).contains(y)));
}

#[test]
fn offset_constant_converges() {
    let mut f = OffsetParameter { shift: 4 }.build().unwrap();
    let y = (0..1000).map(|_| f.next(5000)).last().unwrap();
    assert!((0..16).contains(&y), "{y}");
    let y = (0..1000).map(|_| f.next(-5000)).last().unwrap();
    assert_eq!(y, 0);
}

#[test]
fn ema_smooths_noise() {
    let x = noise(8000, 0, 1 << 16);
    let mut f = ExponentialMovingAverageParameter { shift: 3 }
        .build()
        .unwrap();
    let y: Vec<_> = x.iter().map(|&x| f.next(x)).collect();
    // Noise power gain alpha / (2 - alpha) = 1 / 15
    let ratio = variance(&y) / variance(&x);
    assert!((0.05..0.09).contains(&ratio), "{ratio}");
}

#[test]
fn rectifier() {
    let mut f = FilterParameter::from(AbsParameter).build().unwrap();
    for x in Sample::MIN..=Sample::MAX {
        let y = f.next(x);
        assert!(y >= 0);
        if x != Sample::MIN {
            assert_eq!(y, x.abs());
        }
    }
    assert_eq!(f.saturations(), 1);
}

#[test]
fn unity_cascade() {
    let x = noise(i16::MAX, 0, 1 << 12);
    let unity = BiquadParameter::unity(14).unwrap();
    for n in 1..6 {
        let mut c =
            Cascade::from_biquads(&vec![unity; n]).unwrap();
        for &x in x.iter() {
            assert_eq!(c.next(x), x);
        }
    }
}

#[test]
fn construction_errors() {
    assert_eq!(Cascade::build(&[]).unwrap_err(), Error::EmptyCascade);
    for shift in [16, 17, u8::MAX] {
        let e = Error::UndefinedShift { shift, width: 16 };
        assert_eq!(OffsetParameter { shift }.build().unwrap_err(), e);
        assert_eq!(
            ExponentialMovingAverageParameter { shift }
                .build()
                .unwrap_err(),
            e
        );
        let mut p = LOWPASS;
        p.shift = shift;
        assert_eq!(p.build().unwrap_err(), e);
    }
}

#[test]
fn coefficient_record() {
    let (p, _): (BiquadParameter, _) = serde_json_core::from_str(
        r#"{"b0":329,"b1":658,"b2":329,"a1":-25575,"a2":10508}"#,
    )
    .unwrap();
    assert_eq!(p, LOWPASS);
    let (p, _): (BiquadParameter, _) = serde_json_core::from_str(
        r#"{"b0":1,"b1":0,"b2":0,"a1":0,"a2":0,"shift":0}"#,
    )
    .unwrap();
    assert_eq!(p.shift, 0);
    assert_eq!((p.gain, p.shift_gain, p.shift_return), (1, 0, 0));
}

/// Section record as printed by the design tool for a 2nd order Butterworth
/// lowpass at fc = 0.05 fs.
const DESIGNED: &str = r#"{"gain": 21076, "a0": 16384, "a1": -25575,
    "a2": 10508, "b0": 16384, "b1": 32767, "b2": 16384, "shift_gain": 5,
    "shift_a": 14, "shift_b": 14, "shift_za": 0, "shift_return": 15}"#;

#[test]
fn designed_section_record() {
    let (p, _): (BiquadParameter, _) =
        serde_json_core::from_str(DESIGNED).unwrap();
    assert_eq!(
        (p.gain, p.shift_gain, p.shift, p.shift_return),
        (21076, 5, 14, 15)
    );
    assert_eq!(
        (p.a0, p.shift_a, p.shift_za),
        (Some(16384), Some(14), Some(0))
    );

    // Unity DC gain without saturation
    let mut c = Cascade::from_biquads(&[p, p]).unwrap();
    let y = (0..500).map(|_| c.next(1000)).last().unwrap();
    assert!((999..=1001).contains(&y), "{y}");
    let y = (0..500).map(|_| c.next(-20000)).last().unwrap();
    assert!((-20010..=-19990).contains(&y), "{y}");
    assert_eq!(c.saturations(), 0);

    // Same memory as a bare section
    assert_eq!(check_memory(&[p.into()]), Ok(20));
}

#[test]
fn designed_section_mismatch() {
    let record = DESIGNED.replace(r#""a0": 16384"#, r#""a0": 8192"#);
    let (p, _): (BiquadParameter, _) =
        serde_json_core::from_str(&record).unwrap();
    assert_eq!(
        p.build().unwrap_err(),
        Error::UnsupportedSection {
            field: "a0",
            value: 8192
        }
    );
}

#[test]
fn device_memory() {
    let functions: Vec<_> = chain().iter().map(|p| p.function()).collect();
    assert_eq!(
        functions,
        [
            FilterFunction::Offset,
            FilterFunction::Biquad,
            FilterFunction::Biquad,
            FilterFunction::Abs,
            FilterFunction::ExponentialMovingAverage
        ]
    );
    assert_eq!(check_memory(&chain()), Ok(44));

    // Pass blocks take no filter memory and leave the signal unchanged.
    let mut with_pass = chain().to_vec();
    with_pass.insert(3, PassParameter.into());
    assert_eq!(check_memory(&with_pass), Ok(44));
    assert_eq!(with_pass[3].function(), FilterFunction::Pass);
    let x = noise(8000, 0, 2048);
    let mut a = Cascade::build(&chain()).unwrap();
    let mut b = Cascade::build(&with_pass).unwrap();
    for &x in x.iter() {
        assert_eq!(a.next(x), b.next(x));
    }
}
