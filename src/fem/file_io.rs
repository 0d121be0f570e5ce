use super::SimState;
use crate::base::DEFAULT_OUT_DIR;
use crate::StrError;
use gemlab::mesh::Mesh;
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Assists in generating output files
///
/// Writes (1) both meshes once, (2) one state file per recorded step,
/// (3) one line per step in the record file with the scalar diagnostics
/// (time, boundary flux, solid area, center of mass), and (4) a summary
/// with the recorded indices and times.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileIo {
    /// Holds a flag to enable/disable the file generation
    enabled: bool,

    /// Defines the output directory
    output_dir: String,

    /// Defines the filename stem
    filename_stem: String,

    /// Holds the count of state files written
    output_count: usize,

    /// Holds the indices of the output files
    pub indices: Vec<usize>,

    /// Holds the simulation times corresponding to each output file
    pub times: Vec<f64>,
}

impl FileIo {
    /// Allocates a new instance with deactivated generation of files
    pub fn new() -> Self {
        FileIo {
            enabled: false,
            output_dir: String::new(),
            filename_stem: String::new(),
            output_count: 0,
            indices: Vec::new(),
            times: Vec::new(),
        }
    }

    /// Allocates a new instance and writes both mesh files
    ///
    /// # Input
    ///
    /// * `fluid`, `solid` -- the two meshes
    /// * `filename_stem` -- the last part of the filename without extension, e.g., "my_simulation"
    /// * `output_directory` -- the directory to save the output files.
    ///   None means that the default directory will be used; see [DEFAULT_OUT_DIR]
    pub fn new_enabled(
        fluid: &Mesh,
        solid: &Mesh,
        filename_stem: &str,
        output_directory: Option<&str>,
    ) -> Result<Self, StrError> {
        let out_dir = match output_directory {
            Some(d) => d,
            None => DEFAULT_OUT_DIR,
        };
        fs::create_dir_all(out_dir).map_err(|_| "cannot create output directory")?;
        let file_io = FileIo {
            enabled: true,
            output_dir: out_dir.to_string(),
            filename_stem: filename_stem.to_string(),
            output_count: 0,
            indices: Vec::new(),
            times: Vec::new(),
        };
        fluid.write_json(&file_io.path_mesh("fluid"))?;
        solid.write_json(&file_io.path_mesh("solid"))?;
        // truncate a previous record file
        File::create(file_io.path_record()).map_err(|_| "cannot create file")?;
        Ok(file_io)
    }

    /// Tells whether the file generation is enabled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Generates the filename path for a mesh file ("fluid" or "solid")
    pub fn path_mesh(&self, which: &str) -> String {
        if self.enabled {
            format!("{}/{}-mesh-{}.json", self.output_dir, self.filename_stem, which)
        } else {
            "".to_string()
        }
    }

    /// Generates the filename path for the summary file
    pub fn path_summary(&self) -> String {
        if self.enabled {
            format!("{}/{}-summary.json", self.output_dir, self.filename_stem)
        } else {
            "".to_string()
        }
    }

    /// Generates the filename path for the state files
    pub fn path_state(&self, index: usize) -> String {
        if self.enabled {
            format!("{}/{}-{:0>20}.json", self.output_dir, self.filename_stem, index)
        } else {
            "".to_string()
        }
    }

    /// Generates the filename path for the record file with the scalar diagnostics
    pub fn path_record(&self) -> String {
        if self.enabled {
            format!("{}/{}-record.txt", self.output_dir, self.filename_stem)
        } else {
            "".to_string()
        }
    }

    /// Generates the filename path for a VTU file ("fluid" or "solid")
    pub fn path_vtu(&self, which: &str, index: usize) -> String {
        if self.enabled {
            format!("{}/{}-{}-{:0>20}.vtu", self.output_dir, self.filename_stem, which, index)
        } else {
            "".to_string()
        }
    }

    /// Generates the filename path for a PVD file ("fluid" or "solid")
    pub fn path_pvd(&self, which: &str) -> String {
        if self.enabled {
            format!("{}/{}-{}.pvd", self.output_dir, self.filename_stem, which)
        } else {
            "".to_string()
        }
    }

    /// Reads a JSON file containing this struct
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(file);
        let summary = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(summary)
    }

    /// Writes a JSON file with this struct
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }

    /// Writes the current state to a file
    pub(crate) fn write_state(&mut self, state: &SimState) -> Result<(), StrError> {
        if self.enabled {
            let path = self.path_state(self.output_count);
            state.write_json(&path)?;
            self.indices.push(self.output_count);
            self.times.push(state.t);
            self.output_count += 1;
        }
        Ok(())
    }

    /// Appends one line with the scalar diagnostics to the record file
    pub(crate) fn write_record(&self, t: f64, flux: f64, area: f64, center: &[f64]) -> Result<(), StrError> {
        if self.enabled {
            let mut file = OpenOptions::new()
                .append(true)
                .open(self.path_record())
                .map_err(|_| "cannot open file")?;
            let mut line = format!("{:.6e} {:.6e} {:.6e}", t, flux, area);
            for value in center {
                line.push_str(&format!(" {:.6e}", value));
            }
            line.push('\n');
            file.write_all(line.as_bytes()).map_err(|_| "cannot write file")?;
        }
        Ok(())
    }

    /// Writes this struct to a file
    pub(crate) fn write_self(&self) -> Result<(), StrError> {
        if self.enabled {
            let path = self.path_summary();
            self.write_json(&path)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::FileIo;
    use crate::base::{Config, Layout, StructuredMeshes, DEFAULT_TEST_DIR};
    use crate::fem::SimState;
    use std::fs;

    #[test]
    fn paths_are_empty_when_disabled() {
        let file_io = FileIo::new();
        assert!(!file_io.enabled());
        assert_eq!(file_io.path_mesh("fluid"), "");
        assert_eq!(file_io.path_summary(), "");
        assert_eq!(file_io.path_state(0), "");
        assert_eq!(file_io.path_record(), "");
        assert_eq!(file_io.path_vtu("solid", 1), "");
        assert_eq!(file_io.path_pvd("fluid"), "");
    }

    #[test]
    fn write_state_and_summary_work() {
        let fluid = StructuredMeshes::rectangle(1.0, 1.0, 1, 1).unwrap();
        let solid = StructuredMeshes::annulus(0.5, 0.5, 0.2, 0.3, 1, 4).unwrap();
        let layout = Layout::new(&fluid, &solid).unwrap();
        let config = Config::new();
        let mut state = SimState::new(&fluid, &solid, &layout, &config).unwrap();
        let mut file_io = FileIo::new_enabled(&fluid, &solid, "test_file_io", Some(DEFAULT_TEST_DIR)).unwrap();
        assert!(file_io.path_state(3).ends_with("test_file_io-00000000000000000003.json"));
        file_io.write_state(&state).unwrap();
        state.t = 0.01;
        file_io.write_state(&state).unwrap();
        file_io.write_record(0.01, 0.0, 0.1, &[0.5, 0.5]).unwrap();
        file_io.write_self().unwrap();
        assert_eq!(file_io.indices, &[0, 1]);
        assert_eq!(file_io.times, &[0.0, 0.01]);
        let summary = FileIo::read_json(&file_io.path_summary()).unwrap();
        assert_eq!(summary.indices, &[0, 1]);
        let record = fs::read_to_string(file_io.path_record()).unwrap();
        assert!(record.contains("1.000000e-2") || record.contains("1.000000e-02"));
    }
}
