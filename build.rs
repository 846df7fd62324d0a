fn main() {
    // Only the firmware build links against ESP-IDF; host builds (simulator,
    // tests) have no environment to forward.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
