use std::ffi;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("file contains nil")]
    FileContainsNil,
}

pub struct Resources {
    root_path: PathBuf,
}

impl Resources {
    pub fn from_dir(root_path: impl Into<PathBuf>) -> Resources {
        Resources {
            root_path: root_path.into(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn load_cstring(&self, resource_name: &str) -> Result<ffi::CString, ResError> {
        let mut file = fs::File::open(resource_name_to_path(&self.root_path, resource_name))?;

        // allocate buffer of the same size as file
        let mut buffer: Vec<u8> = Vec::with_capacity(file.metadata()?.len() as usize + 1);
        file.read_to_end(&mut buffer)?;

        // check for nul byte
        if buffer.iter().any(|i| *i == 0) {
            return Err(ResError::FileContainsNil);
        }

        Ok(unsafe { ffi::CString::from_vec_unchecked(buffer) })
    }
}

fn resource_name_to_path(root_dir: &Path, location: &str) -> PathBuf {
    let mut path: PathBuf = root_dir.into();
    for part in location.split('/') {
        path = path.join(part);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("shaders")).unwrap();
        dir
    }

    #[test]
    fn loads_nested_resource() {
        let dir = shader_dir();
        fs::write(dir.path().join("shaders").join("a.vert"), "void main() {}").unwrap();

        let res = Resources::from_dir(dir.path());
        let text = res.load_cstring("shaders/a.vert").unwrap();
        assert_eq!(text.to_str().unwrap(), "void main() {}");
    }

    #[test]
    fn rejects_nul_bytes() {
        let dir = shader_dir();
        fs::write(dir.path().join("shaders").join("b.frag"), b"void\0main").unwrap();

        let res = Resources::from_dir(dir.path());
        assert!(matches!(
            res.load_cstring("shaders/b.frag"),
            Err(ResError::FileContainsNil)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = Resources::from_dir(dir.path().join("does-not-exist"));
        assert!(matches!(res.load_cstring("x.vert"), Err(ResError::Io(_))));
    }
}
