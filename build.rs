fn main() {
    #[cfg(feature = "rdkit")]
    rdkit::compile_bridge();
}

#[cfg(feature = "rdkit")]
mod rdkit {
    use std::env;
    use std::path::PathBuf;

    /// Compile the Morgan bridge against the system RDKit headers.
    /// `rdkit-sys` supplies the link flags for the RDKit libraries.
    pub fn compile_bridge() {
        let mut build = cxx_build::bridge("src/chem/rdkit.rs");
        build.file("cpp/morgan.cc").std("c++17");
        for dir in include_dirs() {
            build.include(dir);
        }
        build.compile("reactcond-rdkit");

        println!("cargo:rustc-link-lib=dylib=RDKitFingerprints");
        println!("cargo:rerun-if-changed=src/chem/rdkit.rs");
        println!("cargo:rerun-if-changed=cpp/morgan.h");
        println!("cargo:rerun-if-changed=cpp/morgan.cc");
        println!("cargo:rerun-if-env-changed=RDKIT_INCLUDE_DIR");
    }

    fn include_dirs() -> Vec<PathBuf> {
        if let Ok(dir) = env::var("RDKIT_INCLUDE_DIR") {
            return vec![PathBuf::from(dir)];
        }
        let mut dirs = Vec::new();
        if let Ok(prefix) = env::var("CONDA_PREFIX") {
            let prefix = PathBuf::from(prefix);
            dirs.push(prefix.join("include").join("rdkit"));
            dirs.push(prefix.join("include"));
        }
        dirs.push(PathBuf::from("/usr/include/rdkit"));
        dirs.push(PathBuf::from("/usr/local/include/rdkit"));
        dirs.push(PathBuf::from("/opt/homebrew/include/rdkit"));
        dirs
    }
}
