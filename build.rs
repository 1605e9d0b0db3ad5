fn main() {
    // Nur der ESP32-Build braucht die ESP-IDF Umgebung; Host-Builds laufen ohne
    if std::env::var_os("CARGO_FEATURE_ESP32").is_some() {
        embuild::espidf::sysenv::output();
    }

    println!("cargo:rerun-if-changed=sdkconfig.defaults");
    println!("cargo:rerun-if-changed=build.rs");
}
