fn main() {
    // Host builds (tests, docs) skip the ESP-IDF environment entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
