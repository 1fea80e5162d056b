//! Prints a recommended heartbeat period for the machine this runs on.
//!
//! Ambient tooling, not core: the calibration surface is two numbers, not
//! worth a `clap` dependency. An optional iteration count is read directly
//! off `std::env::args`.

fn main() {
    tracing_subscriber::fmt::init();

    let iterations = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u32>().ok())
        .unwrap_or(1_000);

    let tau = heartbeat_calibrate::measure_promotion_cost(iterations);
    let calibration = heartbeat_calibrate::calibrate();

    println!("measured promotion cost (tau):  {tau:?} (over {iterations} iterations)");
    println!("recommended heartbeat period:   {:?}", calibration.recommended_n);
    println!(
        "expected sequential overhead:   {:.2}%",
        calibration.expected_overhead_percent
    );
}
