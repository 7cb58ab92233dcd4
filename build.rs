// ABOUTME: Build script generating libGammu bindings when the `native` feature is enabled
// ABOUTME: Locates the library through pkg-config and runs bindgen over gammu.h

fn main() {
    #[cfg(feature = "native")]
    native::generate();
}

#[cfg(feature = "native")]
mod native {
    use std::env;
    use std::path::PathBuf;

    pub fn generate() {
        let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

        // Emits the link flags as a side effect
        let library = pkg_config::Config::new()
            .atleast_version("1.37")
            .probe("gammu")
            .expect("libGammu development files not found via pkg-config");

        let mut builder = bindgen::Builder::default()
            .header_contents("wrapper.h", "#include <gammu.h>\n")
            .rust_edition(bindgen::RustEdition::Edition2024)
            .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
            .prepend_enum_name(false)
            .allowlist_function("GSM_.*")
            .allowlist_function("INI_Free")
            .allowlist_type("GSM_.*")
            .allowlist_type("INI_.*")
            .allowlist_type("EncodeMultiPartSMSID")
            .allowlist_type("SendSMSStatusCallback")
            .allowlist_var("ERR_.*")
            .allowlist_var("SMS_.*")
            .allowlist_var("UDH_.*")
            .allowlist_var("GSM_MAX_.*")
            .derive_debug(false)
            .derive_default(false)
            .layout_tests(false);

        for path in &library.include_paths {
            builder = builder.clang_arg(format!("-I{}", path.display()));
        }

        let bindings = builder
            .generate()
            .expect("Unable to generate libGammu bindings");

        bindings
            .write_to_file(out_dir.join("bindings.rs"))
            .expect("Couldn't write bindings!");
    }
}
